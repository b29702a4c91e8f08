//! # Session Flows
//!
//! Run sessions are pessimistic: nothing changes locally until the server
//! answers, and the coin reward reaches the client through a currency sync.

#[cfg(test)]
mod tests {
    use super::super::fixtures::Harness;
    use client_runtime::{Call, Fault};
    use rl_01_currency::CurrencyApi;
    use rl_05_energy::EnergyApi;
    use rl_07_session::{RunResult, SessionApi, SessionRequest};
    use shared_bus::{ClientEvent, EventFilter};
    use shared_types::{CurrencyType, Domain, OperationResult, SessionState};
    use std::time::Duration;

    fn request() -> SessionRequest {
        SessionRequest {
            track_id: "downtown".into(),
            client_version: "1.4.0".into(),
        }
    }

    fn run(coins: u32) -> RunResult {
        RunResult {
            score: 9_000,
            distance: 1_200,
            coins,
        }
    }

    #[tokio::test]
    async fn test_full_run_rewards_coins_after_sync() {
        let h = Harness::bootstrapped().await;
        let mut states = h.client.bus.subscribe(EventFilter::domains(&[Domain::Session]));

        assert!(h.client.energy.consume(1, "run").await.is_success());
        let ticket = h.client.session.start(request()).await.success().expect("granted");
        assert_eq!(h.client.session.state(), SessionState::Active);
        assert_eq!(h.client.session.session_id(), Some(ticket.session_id.clone()));

        let receipt = h.client.session.submit(run(30)).await.success().expect("accepted");
        assert_eq!(receipt.reward.amount, 30);
        assert_eq!(h.client.session.state(), SessionState::Completed);

        // Rewards are server-side until the next sync.
        assert_eq!(h.client.currency.balance(CurrencyType::SoftCurrency), 250);
        assert!(h.client.currency.sync().await.is_success());
        assert_eq!(h.client.currency.balance(CurrencyType::SoftCurrency), 280);

        let seen: Vec<SessionState> = states
            .drain()
            .into_iter()
            .filter_map(|event| match event {
                ClientEvent::SessionStateChanged { current, .. } => Some(current),
                _ => None,
            })
            .collect();
        assert_eq!(
            seen,
            vec![
                SessionState::Requesting,
                SessionState::Active,
                SessionState::Submitting,
                SessionState::Completed,
            ]
        );
    }

    #[tokio::test]
    async fn test_server_conflict_fails_session() {
        let h = Harness::bootstrapped().await;
        h.backend.modify(|world| world.active_session = Some("other-device".into()));

        let result = h.client.session.start(request()).await;

        assert!(matches!(result, OperationResult::RolledBack { .. }));
        assert_eq!(h.client.session.state(), SessionState::Failed);
        assert_eq!(h.client.session.session_id(), None);
    }

    #[tokio::test]
    async fn test_second_start_refused_while_requesting() {
        let h = Harness::bootstrapped().await;
        h.backend.set_latency(Duration::from_millis(20));

        let (first, second) = tokio::join!(
            h.client.session.start(request()),
            h.client.session.start(request()),
        );

        assert!(first.is_success());
        assert!(matches!(second, OperationResult::ValidationError(_)));
        assert_eq!(h.backend.call_count(Call::RequestSession), 1);
    }

    #[tokio::test]
    async fn test_rejected_submit_can_restart() {
        let h = Harness::bootstrapped().await;
        assert!(h.client.session.start(request()).await.is_success());
        h.backend
            .inject(Call::SubmitSession, Fault::Reject("score too high".into()));

        let result = h.client.session.submit(run(10)).await;

        assert!(matches!(result, OperationResult::RolledBack { .. }));
        assert_eq!(h.client.session.state(), SessionState::Failed);
        assert_eq!(h.server_balance(CurrencyType::SoftCurrency), 250);

        // The server still holds the old session until it is cancelled or
        // expires, so clear it the way an expiry would.
        h.backend.modify(|world| world.active_session = None);
        assert!(h.client.session.start(request()).await.is_success());
    }

    #[tokio::test]
    async fn test_cancel_releases_server_session() {
        let h = Harness::bootstrapped().await;
        assert!(h.client.session.start(request()).await.is_success());

        assert!(h.client.session.cancel().is_success());
        assert_eq!(h.client.session.state(), SessionState::Cancelled);

        // The notice goes out in the background.
        for _ in 0..10 {
            if h.backend.world().active_session.is_none() {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(h.backend.world().active_session, None);
        assert_eq!(h.backend.call_count(Call::CancelSession), 1);
    }

    #[tokio::test]
    async fn test_response_after_sign_out_is_cancelled() {
        let h = Harness::bootstrapped().await;
        h.backend.set_latency(Duration::from_millis(20));

        let (result, ()) = tokio::join!(h.client.session.start(request()), async {
            tokio::task::yield_now().await;
            h.client.sign_out();
        });

        assert_eq!(result, OperationResult::Cancelled);
        assert_eq!(h.client.session.state(), SessionState::None);
    }
}
