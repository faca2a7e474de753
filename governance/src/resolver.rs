//! Profile bindings → canonical CKB addresses.

use crate::error::BindingError;
use std::collections::HashSet;
use tracing::warn;
use watchdog_crypto::{derive_pw_lock_address, parse_address};
use watchdog_types::{AddressBinding, CkbAddress, NetworkId};

/// Addresses resolved from one profile plus the number of bindings dropped.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Resolution {
    pub addresses: Vec<CkbAddress>,
    pub skipped: usize,
}

pub struct AddressResolver {
    network: NetworkId,
}

impl AddressResolver {
    pub fn new(network: NetworkId) -> Self {
        Self { network }
    }

    pub fn network(&self) -> NetworkId {
        self.network
    }

    /// Resolve a single binding.
    pub fn resolve_binding(&self, binding: &AddressBinding) -> Result<CkbAddress, BindingError> {
        let raw = binding.raw().trim();
        if raw.is_empty() {
            return Err(BindingError::Empty);
        }
        match binding {
            AddressBinding::Native(_) => {
                parse_address(raw, self.network).map_err(|source| BindingError::Native {
                    raw: raw.to_string(),
                    source,
                })
            }
            AddressBinding::Derived(_) => {
                derive_pw_lock_address(raw, self.network).map_err(|source| BindingError::Derived {
                    raw: raw.to_string(),
                    source,
                })
            }
        }
    }

    /// Resolve every binding, dropping malformed ones and duplicates.
    ///
    /// Output keeps first-seen order.
    pub fn resolve(&self, bindings: &[AddressBinding]) -> Vec<CkbAddress> {
        self.resolve_counted(bindings).addresses
    }

    /// As [`resolve`](Self::resolve), also reporting how many bindings were skipped.
    pub fn resolve_counted(&self, bindings: &[AddressBinding]) -> Resolution {
        let mut seen = HashSet::new();
        let mut resolution = Resolution::default();
        for binding in bindings {
            match self.resolve_binding(binding) {
                Ok(address) => {
                    if seen.insert(address.clone()) {
                        resolution.addresses.push(address);
                    }
                }
                Err(e) => {
                    warn!(kind = binding.kind(), error = %e, "skipping malformed binding");
                    resolution.skipped += 1;
                }
            }
        }
        resolution
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHORT: &str = "ckb1qyqt8xaupvm8837nv3gtc9x0ekkj64vud3jqfwyw5v";
    const FULL: &str = "ckb1qzda0cr08m85hc8jlnfp3zer7xulejywt49kt2rr0vthywaa50xwsqdnnw7qkdnnclfkg59uzn8umtfd2kwxceqxwquc4";
    const METAMASK: &str = "0xf93178475F922083335B91c4B9a70E66172A8391";
    const METAMASK_PW_LOCK: &str = "ckb1qzl58smqy32hnrq6vxjedcxe2fugvnz497h7yvwqvwel40uh4rltcq0ex9uywhujyzpnxku3cju6wrnxzu4g8ygkgw0rr";

    fn resolver() -> AddressResolver {
        AddressResolver::new(NetworkId::Mainnet)
    }

    #[test]
    fn test_native_address_is_canonicalised() {
        let address = resolver()
            .resolve_binding(&AddressBinding::Native(FULL.to_uppercase()))
            .unwrap();
        assert_eq!(address.as_str(), FULL);
    }

    #[test]
    fn test_derived_binding_yields_pw_lock_address() {
        let address = resolver()
            .resolve_binding(&AddressBinding::Derived(METAMASK.into()))
            .unwrap();
        assert_eq!(address.as_str(), METAMASK_PW_LOCK);
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let r = resolver();
        let binding = AddressBinding::Derived(METAMASK.into());
        assert_eq!(r.resolve_binding(&binding).unwrap(), r.resolve_binding(&binding).unwrap());
    }

    #[test]
    fn test_wrong_network_is_rejected() {
        let err = AddressResolver::new(NetworkId::Testnet)
            .resolve_binding(&AddressBinding::Native(FULL.into()))
            .unwrap_err();
        assert!(matches!(err, BindingError::Native { .. }));
    }

    #[test]
    fn test_empty_binding_is_rejected() {
        assert!(matches!(
            resolver().resolve_binding(&AddressBinding::Native("  ".into())),
            Err(BindingError::Empty)
        ));
    }

    #[test]
    fn test_resolve_dedupes_in_first_seen_order() {
        let bindings = vec![
            AddressBinding::Native(SHORT.into()),
            AddressBinding::Native(FULL.into()),
            AddressBinding::Native(SHORT.to_uppercase()),
            AddressBinding::Derived(METAMASK.into()),
            AddressBinding::Derived(METAMASK.to_lowercase()),
        ];
        let addresses: Vec<String> = resolver()
            .resolve(&bindings)
            .into_iter()
            .map(|a| a.as_str().to_string())
            .collect();
        assert_eq!(addresses, vec![FULL, METAMASK_PW_LOCK]);
    }

    #[test]
    fn test_short_and_full_encodings_of_one_lock_collapse() {
        let r = resolver();
        let short = r.resolve_binding(&AddressBinding::Native(SHORT.into())).unwrap();
        let full = r.resolve_binding(&AddressBinding::Native(FULL.into())).unwrap();
        assert_eq!(short, full);
        assert_eq!(short.as_str(), FULL);
    }

    #[test]
    fn test_malformed_entries_are_skipped_not_fatal() {
        let bindings = vec![
            AddressBinding::Native("not-an-address".into()),
            AddressBinding::Derived("0x1234".into()),
            AddressBinding::Native(FULL.into()),
        ];
        let resolution = resolver().resolve_counted(&bindings);
        assert_eq!(resolution.addresses, vec![CkbAddress::new(FULL)]);
        assert_eq!(resolution.skipped, 2);
    }

    #[test]
    fn test_no_bindings_resolve_to_nothing() {
        assert!(resolver().resolve(&[]).is_empty());
    }
}
