//! Settings password, lockout and admin sessions

use heapless::String;
use log::{info, warn};

use crate::config::{
    ADMIN_MASTER_KEY, DEFAULT_PASSWORD, LOCKOUT_MS, PASSWORD_ATTEMPTS, TEMP_ADMIN_MS,
};
use crate::console::{parse_positive_int, Bound};
use crate::error::InputError;
use crate::timer::CountDownTimer;

pub const PASSWORD_CAPACITY: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminSession {
    Guest,
    /// Logged in as admin at startup
    Permanent,
    /// Granted from the system menu, expires on its own
    Temporary(CountDownTimer),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordCheck {
    Granted,
    Denied { attempts_left: u8 },
    /// Out of attempts, or already locked out
    LockedOut,
}

#[derive(Debug, Clone)]
pub struct AccessControl {
    password: String<PASSWORD_CAPACITY>,
    attempts_left: u8,
    lockout: CountDownTimer,
    session: AdminSession,
}

impl Default for AccessControl {
    fn default() -> Self {
        let mut password = String::new();
        let _ = password.push_str(DEFAULT_PASSWORD);
        Self {
            password,
            attempts_left: PASSWORD_ATTEMPTS,
            lockout: CountDownTimer::stopped(),
            session: AdminSession::Guest,
        }
    }
}

impl AccessControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    /// New passwords must be positive whole numbers; they are kept as typed
    pub fn set_password(&mut self, input: &str) -> Result<(), InputError> {
        let input = input.trim();
        parse_positive_int(input, Bound::Unbounded)?;
        let mut password = String::new();
        password.push_str(input).map_err(|_| InputError::OutOfRange)?;
        self.password = password;
        info!("system password changed");
        Ok(())
    }

    pub fn attempts_left(&self) -> u8 {
        self.attempts_left
    }

    pub fn session(&self) -> AdminSession {
        self.session
    }

    /// Clears a lockout whose time is up. Returns true if one just ended.
    pub fn expire_lockout(&mut self, now_ms: u64) -> bool {
        if self.lockout.is_finished(now_ms) {
            self.lockout.stop();
            self.attempts_left = PASSWORD_ATTEMPTS;
            info!("settings lockout ended");
            true
        } else {
            false
        }
    }

    pub fn is_locked_out(&mut self, now_ms: u64) -> bool {
        self.expire_lockout(now_ms);
        self.lockout.is_running()
    }

    pub fn lockout_remaining_ms(&self, now_ms: u64) -> u64 {
        self.lockout.remaining_ms(now_ms)
    }

    /// A correct password restores every attempt. The last failed attempt
    /// starts the lockout.
    pub fn check_password(&mut self, attempt: &str, now_ms: u64) -> PasswordCheck {
        if self.is_locked_out(now_ms) {
            return PasswordCheck::LockedOut;
        }
        if attempt.trim() == self.password.as_str() {
            self.attempts_left = PASSWORD_ATTEMPTS;
            return PasswordCheck::Granted;
        }

        self.attempts_left = self.attempts_left.saturating_sub(1);
        if self.attempts_left == 0 {
            warn!("settings locked out after {} failed attempts", PASSWORD_ATTEMPTS);
            self.lockout.start(now_ms, LOCKOUT_MS);
            PasswordCheck::LockedOut
        } else {
            PasswordCheck::Denied {
                attempts_left: self.attempts_left,
            }
        }
    }

    /// Admin override. Returns false if there was no lockout to clear.
    pub fn override_lockout(&mut self, now_ms: u64) -> bool {
        let was_locked = self.is_locked_out(now_ms);
        self.lockout.stop();
        self.attempts_left = PASSWORD_ATTEMPTS;
        was_locked
    }

    fn key_matches(key: &str) -> bool {
        key.trim() == ADMIN_MASTER_KEY
    }

    /// Startup login; a wrong key leaves the operator a guest
    pub fn login_admin(&mut self, key: &str) -> bool {
        if Self::key_matches(key) {
            self.session = AdminSession::Permanent;
            true
        } else {
            self.session = AdminSession::Guest;
            false
        }
    }

    /// Temporary admin from the system menu. An existing session is kept.
    pub fn grant_temporary_admin(&mut self, key: &str, now_ms: u64) -> bool {
        if !Self::key_matches(key) {
            return false;
        }
        if self.session == AdminSession::Guest {
            let mut timer = CountDownTimer::stopped();
            timer.start(now_ms, TEMP_ADMIN_MS);
            self.session = AdminSession::Temporary(timer);
            info!("temporary admin access granted");
        }
        true
    }

    /// Drops an expired temporary session. Returns true if one just expired.
    pub fn expire_session(&mut self, now_ms: u64) -> bool {
        match self.session {
            AdminSession::Temporary(timer) if timer.is_finished(now_ms) => {
                self.session = AdminSession::Guest;
                info!("temporary admin access revoked");
                true
            }
            _ => false,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.session != AdminSession::Guest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_failures_lock_out_for_fifty_seconds() {
        let mut access = AccessControl::new();
        assert_eq!(access.check_password("1", 0), PasswordCheck::Denied { attempts_left: 2 });
        assert_eq!(access.check_password("2", 0), PasswordCheck::Denied { attempts_left: 1 });
        assert_eq!(access.check_password("3", 1_000), PasswordCheck::LockedOut);

        // even the right password is refused while locked out
        assert_eq!(access.check_password(DEFAULT_PASSWORD, 20_000), PasswordCheck::LockedOut);
        assert_eq!(access.lockout_remaining_ms(21_000), 30_000);
        assert!(access.is_locked_out(50_999));

        assert!(!access.is_locked_out(51_000));
        assert_eq!(access.attempts_left(), PASSWORD_ATTEMPTS);
        assert_eq!(access.check_password(DEFAULT_PASSWORD, 51_000), PasswordCheck::Granted);
    }

    #[test]
    fn correct_password_restores_attempts() {
        let mut access = AccessControl::new();
        access.check_password("nope", 0);
        access.check_password("nope", 0);
        assert_eq!(access.check_password(" 332450 ", 0), PasswordCheck::Granted);
        assert_eq!(access.attempts_left(), PASSWORD_ATTEMPTS);
    }

    #[test]
    fn admin_override_clears_lockout() {
        let mut access = AccessControl::new();
        assert!(!access.override_lockout(0));
        for _ in 0..PASSWORD_ATTEMPTS {
            access.check_password("bad", 0);
        }
        assert!(access.is_locked_out(10));
        assert!(access.override_lockout(10));
        assert!(!access.is_locked_out(10));
        assert_eq!(access.check_password(DEFAULT_PASSWORD, 10), PasswordCheck::Granted);
    }

    #[test]
    fn password_must_be_a_positive_integer() {
        let mut access = AccessControl::new();
        assert_eq!(access.set_password("abc"), Err(InputError::NotInteger));
        assert_eq!(access.set_password("-5"), Err(InputError::NotPositive));
        access.set_password("0042").unwrap();
        assert_eq!(access.password(), "0042");
        assert_eq!(access.check_password("0042", 0), PasswordCheck::Granted);
    }

    #[test]
    fn startup_login_needs_the_master_key() {
        let mut access = AccessControl::new();
        assert!(!access.login_admin("1234"));
        assert_eq!(access.session(), AdminSession::Guest);
        assert!(access.login_admin(ADMIN_MASTER_KEY));
        assert!(access.is_admin());
        assert!(!access.expire_session(u64::MAX));
    }

    #[test]
    fn temporary_admin_expires_after_thirty_seconds() {
        let mut access = AccessControl::new();
        assert!(!access.grant_temporary_admin("9999", 0));
        assert!(!access.is_admin());

        assert!(access.grant_temporary_admin(ADMIN_MASTER_KEY, 1_000));
        assert!(access.is_admin());
        assert!(!access.expire_session(30_999));
        assert!(access.expire_session(31_000));
        assert!(!access.is_admin());
        assert!(!access.expire_session(31_000));
    }
}
