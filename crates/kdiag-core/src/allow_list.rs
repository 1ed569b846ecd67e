//! Allow list for four letter commands
//!
//! Operators enable commands with a single string: `*` for everything, or a
//! comma and/or whitespace separated list of four letter names. A known
//! command that is missing from the list behaves exactly like an unknown one
//! when dispatched.

use std::collections::HashSet;

use tracing::warn;

use crate::codec::CommandCode;
use crate::types::schema::OP_ALLOW_LIST_INIT;

/// Token that enables every command
pub const ALLOW_ALL_TOKEN: &str = "*";

/// Parsed allow list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowList {
    /// Every code is enabled, registered or not
    All,
    /// Only these codes are enabled
    Only(HashSet<CommandCode>),
}

impl Default for AllowList {
    /// Nothing enabled
    fn default() -> Self {
        AllowList::Only(HashSet::new())
    }
}

impl AllowList {
    /// Parse an allow-list specification
    ///
    /// A `*` token anywhere yields `All`. Tokens that are not exactly four
    /// bytes are skipped with a warning. Duplicates and order do not matter.
    pub fn parse(spec: &str) -> Self {
        let mut codes = HashSet::new();
        for token in spec
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|t| !t.is_empty())
        {
            if token == ALLOW_ALL_TOKEN {
                return AllowList::All;
            }
            match CommandCode::from_name(token) {
                Some(code) => {
                    codes.insert(code);
                }
                None => {
                    warn!(
                        op = OP_ALLOW_LIST_INIT,
                        token = token,
                        "Invalid four letter command in allow list, ignoring it"
                    );
                }
            }
        }
        AllowList::Only(codes)
    }

    /// Drop explicit codes for which `is_known` is false, warning for each
    ///
    /// `All` is returned unchanged.
    pub fn retain_known(self, is_known: impl Fn(CommandCode) -> bool) -> Self {
        match self {
            AllowList::All => AllowList::All,
            AllowList::Only(codes) => {
                let (known, unknown): (HashSet<_>, HashSet<_>) =
                    codes.into_iter().partition(|code| is_known(*code));
                for code in unknown {
                    warn!(
                        op = OP_ALLOW_LIST_INIT,
                        command = %code,
                        "Allow list names an unregistered four letter command, ignoring it"
                    );
                }
                AllowList::Only(known)
            }
        }
    }

    /// Whether a code may be executed
    pub fn permits(&self, code: CommandCode) -> bool {
        match self {
            AllowList::All => true,
            AllowList::Only(codes) => codes.contains(&code),
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, AllowList::All)
    }

    /// Enabled names in ascending order; `["*"]` for the wildcard
    pub fn names(&self) -> Vec<String> {
        match self {
            AllowList::All => vec![ALLOW_ALL_TOKEN.to_string()],
            AllowList::Only(codes) => {
                let mut names: Vec<String> = codes.iter().map(|c| c.name()).collect();
                names.sort();
                names
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(name: &str) -> CommandCode {
        CommandCode::from_name(name).unwrap()
    }

    #[test]
    fn test_wildcard_anywhere_enables_all() {
        assert!(AllowList::parse("*").is_all());
        assert!(AllowList::parse("ruok, *").is_all());
    }

    #[test]
    fn test_mixed_separators() {
        let list = AllowList::parse(" ruok,mntr  stat\tsrvr ,, ");
        for name in ["ruok", "mntr", "stat", "srvr"] {
            assert!(list.permits(code(name)), "{} should be enabled", name);
        }
        assert!(!list.permits(code("conf")));
        assert_eq!(list.names(), vec!["mntr", "ruok", "srvr", "stat"]);
    }

    #[test]
    fn test_wrong_length_tokens_are_skipped() {
        let list = AllowList::parse("ruok,mn,monitor");
        assert_eq!(list.names(), vec!["ruok"]);
    }

    #[test]
    fn test_empty_spec_enables_nothing() {
        let list = AllowList::parse("");
        assert_eq!(list, AllowList::default());
        assert!(!list.permits(code("ruok")));
    }

    #[test]
    fn test_retain_known_drops_unregistered() {
        let list = AllowList::parse("ruok,xxxx").retain_known(|c| c == code("ruok"));
        assert_eq!(list.names(), vec!["ruok"]);
        assert!(AllowList::All.retain_known(|_| false).is_all());
    }
}
