//! # Outbound Ports

use crate::domain::{Achievement, AchievementBook};
use async_trait::async_trait;
use shared_types::{GatewayError, RemoteReply};

/// Server gateway for the achievements domain.
#[async_trait]
pub trait AchievementsGateway: Send + Sync {
    /// Record progress. Replies with the server's record.
    async fn report_progress(
        &self,
        id: &str,
        progress: u32,
    ) -> Result<RemoteReply<Achievement>, GatewayError>;

    /// Confirm a reward claim. Replies with the server's record.
    async fn claim_achievement(&self, id: &str) -> Result<RemoteReply<Achievement>, GatewayError>;

    /// Fetch every achievement.
    async fn fetch_achievements(&self) -> Result<AchievementBook, GatewayError>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    #[derive(Debug, Clone)]
    pub enum Scripted {
        Reject(String),
        Conflict(String),
        Fail(GatewayError),
    }

    #[derive(Default)]
    pub struct MockAchievementsGateway {
        pub server: Mutex<AchievementBook>,
        pub script: Mutex<VecDeque<Scripted>>,
        pub calls: Mutex<Vec<String>>,
    }

    impl MockAchievementsGateway {
        pub fn with_book(book: AchievementBook) -> Self {
            Self {
                server: Mutex::new(book),
                ..Self::default()
            }
        }

        pub fn push(&self, scripted: Scripted) {
            self.script.lock().push_back(scripted);
        }

        fn scripted<T>(&self, call: &str) -> Option<Result<RemoteReply<T>, GatewayError>> {
            self.calls.lock().push(call.to_string());
            match self.script.lock().pop_front()? {
                Scripted::Reject(reason) => Some(Ok(RemoteReply::Rejected(reason))),
                Scripted::Conflict(reason) => Some(Ok(RemoteReply::Conflict(reason))),
                Scripted::Fail(error) => Some(Err(error)),
            }
        }
    }

    #[async_trait]
    impl AchievementsGateway for MockAchievementsGateway {
        async fn report_progress(
            &self,
            id: &str,
            progress: u32,
        ) -> Result<RemoteReply<Achievement>, GatewayError> {
            if let Some(reply) = self.scripted("progress") {
                return reply;
            }
            let mut server = self.server.lock();
            let Some(achievement) = server.get_mut(id) else {
                return Ok(RemoteReply::Rejected(format!("unknown achievement {id}")));
            };
            achievement.progress = achievement.progress.max(progress.min(achievement.target));
            achievement.unlocked = achievement.progress >= achievement.target;
            Ok(RemoteReply::Accepted(*achievement))
        }

        async fn claim_achievement(
            &self,
            id: &str,
        ) -> Result<RemoteReply<Achievement>, GatewayError> {
            if let Some(reply) = self.scripted("claim") {
                return reply;
            }
            let mut server = self.server.lock();
            match server.get_mut(id) {
                Some(achievement) if achievement.is_claimable() => {
                    achievement.claimed = true;
                    Ok(RemoteReply::Accepted(*achievement))
                }
                Some(_) => Ok(RemoteReply::Conflict(format!("{id} not claimable"))),
                None => Ok(RemoteReply::Rejected(format!("unknown achievement {id}"))),
            }
        }

        async fn fetch_achievements(&self) -> Result<AchievementBook, GatewayError> {
            Ok(self.server.lock().clone())
        }
    }
}
