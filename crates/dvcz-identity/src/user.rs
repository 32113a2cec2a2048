use std::str::FromStr;

use dvcz_crypto::{KeyPair, PublicKey, PRIVATE_KEY_PEM_END};
use dvcz_types::validate_name;

use crate::error::{IdentityError, IdentityResult};

pub const USER_START: &str = "-----START DVCZ USER-----";
pub const USER_END: &str = "-----END DVCZ USER-----";

/// A dvcz user: a login plus private signing and encryption keys.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct User {
    login: String,
    signing: KeyPair,
    encryption: KeyPair,
    key_bits: u32,
}

impl User {
    /// Create a user with freshly generated keys.
    pub fn generate(login: &str, key_bits: u32) -> IdentityResult<Self> {
        let signing = KeyPair::generate(key_bits)?;
        let encryption = KeyPair::generate(key_bits)?;
        Self::from_keys(login, signing, encryption)
    }

    /// Create a user from existing keys.
    pub fn from_keys(login: &str, signing: KeyPair, encryption: KeyPair) -> IdentityResult<Self> {
        validate_name("login", login)?;
        if signing.bits() != encryption.bits() {
            return Err(IdentityError::Format(format!(
                "key sizes differ: {} and {} bits",
                signing.bits(),
                encryption.bits()
            )));
        }
        Ok(Self {
            login: login.to_string(),
            key_bits: signing.bits(),
            signing,
            encryption,
        })
    }

    pub fn login(&self) -> &str {
        &self.login
    }

    /// Key used for digital signatures.
    pub fn signing_key(&self) -> &KeyPair {
        &self.signing
    }

    /// Key used for encryption.
    pub fn encryption_key(&self) -> &KeyPair {
        &self.encryption
    }

    pub fn key_bits(&self) -> u32 {
        self.key_bits
    }

    /// The public view of this user.
    pub fn to_public(&self) -> PubUser {
        PubUser {
            login: self.login.clone(),
            signing: self.signing.public_part(),
            encryption: self.encryption.public_part(),
        }
    }

    /// Render the user block, newline-terminated.
    pub fn serialize(&self) -> IdentityResult<String> {
        Ok(format!(
            "{USER_START}\n{}\n{}\n{}\n{USER_END}\n",
            self.login,
            self.signing.to_pem()?,
            self.encryption.to_pem()?,
        ))
    }

    /// Parse a user block from lines with trailing blank lines removed.
    pub(crate) fn from_lines(lines: &[&str]) -> IdentityResult<Self> {
        if lines.len() < 5 {
            return Err(IdentityError::Format(format!(
                "too few lines ({}) in user block",
                lines.len()
            )));
        }
        expect_line(lines[0], USER_START)?;
        let login = lines[1];
        let (signing, offset) = collect_private_key(lines, 2)?;
        let (encryption, offset) = collect_private_key(lines, offset)?;
        match lines.get(offset) {
            Some(line) => expect_line(line, USER_END)?,
            None => {
                return Err(IdentityError::Format(format!(
                    "missing '{USER_END}'"
                )))
            }
        }
        if offset + 1 != lines.len() {
            return Err(IdentityError::Format(format!(
                "unexpected content after '{USER_END}'"
            )));
        }
        Self::from_keys(login, signing, encryption)
    }
}

impl FromStr for User {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_lines(&block_lines(s)?)
    }
}

/// The public view of a [`User`]. There is no way back to a `User`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PubUser {
    login: String,
    signing: PublicKey,
    encryption: PublicKey,
}

impl PubUser {
    pub fn login(&self) -> &str {
        &self.login
    }

    pub fn signing_key(&self) -> &PublicKey {
        &self.signing
    }

    pub fn encryption_key(&self) -> &PublicKey {
        &self.encryption
    }
}

/// Split a block into lines, dropping trailing empty ones.
pub(crate) fn block_lines(text: &str) -> IdentityResult<Vec<&str>> {
    if text.is_empty() {
        return Err(IdentityError::Format("empty string".into()));
    }
    let mut lines: Vec<&str> = text.split('\n').collect();
    while lines.last() == Some(&"") {
        lines.pop();
    }
    Ok(lines)
}

pub(crate) fn expect_line(found: &str, wanted: &str) -> IdentityResult<()> {
    if found != wanted {
        return Err(IdentityError::Format(format!(
            "found '{found}' instead of '{wanted}'"
        )));
    }
    Ok(())
}

/// Read one PEM private key starting at `offset`. Returns the key and the
/// index of the line after its end marker.
fn collect_private_key(lines: &[&str], offset: usize) -> IdentityResult<(KeyPair, usize)> {
    let end = lines
        .iter()
        .skip(offset)
        .position(|line| *line == PRIVATE_KEY_PEM_END)
        .map(|i| offset + i)
        .ok_or_else(|| IdentityError::Format("can't find end of PEM-formatted key".into()))?;
    let pem = lines[offset..=end].join("\n");
    Ok((KeyPair::from_pem(&pem)?, end + 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dvcz_crypto::KEY_BITS;

    fn user() -> User {
        User::from_keys("jdd", KeyPair::from_bytes([1; 32]), KeyPair::from_bytes([2; 32])).unwrap()
    }

    #[test]
    fn block_roundtrip() {
        let u = user();
        let text = u.serialize().unwrap();
        assert!(text.starts_with(USER_START));
        assert!(text.ends_with(&format!("{USER_END}\n")));
        let parsed: User = text.parse().unwrap();
        assert_eq!(parsed, u);
        assert_eq!(parsed.login(), "jdd");
        assert_eq!(parsed.key_bits(), KEY_BITS);
    }

    #[test]
    fn generated_user_roundtrips() {
        let u = User::generate("alice", KEY_BITS).unwrap();
        let parsed: User = u.serialize().unwrap().parse().unwrap();
        assert_eq!(parsed, u);
        assert_ne!(u.signing_key(), u.encryption_key());
    }

    #[test]
    fn invalid_login() {
        assert!(matches!(
            User::generate("bad login", KEY_BITS),
            Err(IdentityError::Validation(_))
        ));
    }

    #[test]
    fn unsupported_key_size() {
        assert!(matches!(
            User::generate("alice", 2048),
            Err(IdentityError::Key(_))
        ));
    }

    #[test]
    fn wrong_start_marker() {
        let text = user().serialize().unwrap().replacen("START", "BEGIN", 1);
        let err = text.parse::<User>().unwrap_err();
        assert!(matches!(err, IdentityError::Format(m) if m.contains("instead of")));
    }

    #[test]
    fn too_few_lines() {
        let text = format!("{USER_START}\njdd\n{USER_END}\n");
        assert!(matches!(text.parse::<User>(), Err(IdentityError::Format(_))));
        assert!(matches!("".parse::<User>(), Err(IdentityError::Format(_))));
    }

    #[test]
    fn missing_pem_end() {
        let text = user()
            .serialize()
            .unwrap()
            .replace(PRIVATE_KEY_PEM_END, "-----END SOMETHING-----");
        let err = text.parse::<User>().unwrap_err();
        assert!(matches!(err, IdentityError::Format(m) if m.contains("PEM")));
    }

    #[test]
    fn wrong_end_marker() {
        let text = user().serialize().unwrap().replace(USER_END, "-----END DVCZ USR-----");
        assert!(matches!(text.parse::<User>(), Err(IdentityError::Format(_))));
    }

    #[test]
    fn public_view_matches_private_keys() {
        let u = user();
        let public = u.to_public();
        assert_eq!(public.login(), "jdd");
        assert_eq!(public.signing_key(), &u.signing_key().public_part());
        assert_eq!(public.encryption_key(), &u.encryption_key().public_part());
    }
}
