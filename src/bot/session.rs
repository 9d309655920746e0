use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};

/// Authenticated admin sessions keyed by Telegram user id. Expiry is an
/// explicit policy: with no TTL configured, sessions last until /logout.
pub struct SessionStore {
    sessions: Mutex<HashMap<i64, DateTime<Utc>>>,
    ttl: Option<Duration>,
}

impl SessionStore {
    pub fn new(ttl_minutes: Option<u64>) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            ttl: ttl_minutes.map(|m| Duration::minutes(m as i64)),
        }
    }

    pub fn login(&self, user_id: i64) {
        self.sessions.lock().unwrap().insert(user_id, Utc::now());
    }

    /// Returns false when there was no session to drop.
    pub fn logout(&self, user_id: i64) -> bool {
        self.sessions.lock().unwrap().remove(&user_id).is_some()
    }

    pub fn is_authenticated(&self, user_id: i64) -> bool {
        let mut sessions = self.sessions.lock().unwrap();
        let Some(&started) = sessions.get(&user_id) else {
            return false;
        };
        if let Some(ttl) = self.ttl {
            if Utc::now() - started > ttl {
                sessions.remove(&user_id);
                return false;
            }
        }
        true
    }

    #[cfg(test)]
    fn login_at(&self, user_id: i64, at: DateTime<Utc>) {
        self.sessions.lock().unwrap().insert(user_id, at);
    }
}
