//! Signup credential generation with an injectable random source, so
//! tests can seed the generator and assert exact output.

use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::Serialize;

const USERNAME_DIGITS: usize = 6;
const PASSWORD_LEN: usize = 8;

#[derive(Debug, Clone, Serialize)]
pub struct SignupCredentials {
    pub username: String,
    pub password: String,
}

/// Generate a throwaway operator account: "user" plus six digits, and an
/// eight-character alphanumeric password.
pub fn generate_signup_credentials<R: Rng>(rng: &mut R) -> SignupCredentials {
    let digits: String = (0..USERNAME_DIGITS)
        .map(|_| char::from(b'0' + rng.gen_range(0..10)))
        .collect();

    let password: String = rng
        .sample_iter(&Alphanumeric)
        .take(PASSWORD_LEN)
        .map(char::from)
        .collect();

    SignupCredentials {
        username: format!("user{}", digits),
        password,
    }
}
