use crate::common::decode;

/// Bootstrap init code deployed by 0age's MetamorphicContractFactory: it asks
/// the caller for the runtime code and returns it verbatim.
/// https://github.com/0age/metamorphic/blob/master/contracts/MetamorphicContractFactory.sol
pub const METAMORPHIC_INIT_CODE: [u8; 29] =
    decode("0x5860208158601c335a63aaf10f428752fa158151803b80938091923cf3");

/// Known metamorphic init-code signatures. An init code matches when it
/// contains any of them.
#[derive(Clone, Debug)]
pub struct Signatures(Vec<Vec<u8>>);

impl Default for Signatures {
    fn default() -> Self {
        Self(vec![METAMORPHIC_INIT_CODE.to_vec()])
    }
}

impl Signatures {
    /// No signatures at all; nothing will match.
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn with(mut self, signature: Vec<u8>) -> Self {
        self.push(signature);
        self
    }

    pub fn push(&mut self, signature: Vec<u8>) {
        if !signature.is_empty() && !self.0.contains(&signature) {
            self.0.push(signature);
        }
    }

    /// Parse `0x`-optional hex signatures separated by commas or whitespace.
    pub fn parse_list(list: &str) -> eyre::Result<Vec<Vec<u8>>> {
        list.split(|c: char| c == ',' || c.is_whitespace())
            .filter(|item| !item.is_empty())
            .map(|item| {
                let hex = item.strip_prefix("0x").unwrap_or(item);
                hex::decode(hex).map_err(|e| eyre::eyre!("invalid init code signature '{item}': {e}"))
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn matches(&self, init_code: &[u8]) -> bool {
        self.0
            .iter()
            .any(|signature| contains(init_code, signature))
    }
}

impl Extend<Vec<u8>> for Signatures {
    fn extend<T: IntoIterator<Item = Vec<u8>>>(&mut self, iter: T) {
        for signature in iter {
            self.push(signature);
        }
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|window| window == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant() {
        assert_eq!(
            hex::encode(METAMORPHIC_INIT_CODE),
            "5860208158601c335a63aaf10f428752fa158151803b80938091923cf3"
        );
    }

    #[test]
    fn test_exact_match() {
        assert!(Signatures::default().matches(&METAMORPHIC_INIT_CODE));
    }

    #[test]
    fn test_embedded_match() {
        let mut code = vec![0x60, 0x80];
        code.extend_from_slice(&METAMORPHIC_INIT_CODE);
        code.push(0x00);
        assert!(Signatures::default().matches(&code));
    }

    #[test]
    fn test_single_byte_mutation() {
        let signatures = Signatures::default();
        for i in 0..METAMORPHIC_INIT_CODE.len() {
            let mut code = METAMORPHIC_INIT_CODE;
            code[i] = code[i].wrapping_add(1);
            assert!(!signatures.matches(&code), "byte {i}");
        }
    }

    #[test]
    fn test_short_or_empty_code() {
        let signatures = Signatures::default();
        assert!(!signatures.matches(&[]));
        assert!(!signatures.matches(&METAMORPHIC_INIT_CODE[..28]));
        assert!(!Signatures::empty().matches(&METAMORPHIC_INIT_CODE));
    }

    #[test]
    fn test_extend() -> eyre::Result<()> {
        let mut signatures = Signatures::default();
        signatures.extend(Signatures::parse_list(
            "0xdeadbeef, cafe\n0x5860208158601c335a63aaf10f428752fa158151803b80938091923cf3",
        )?);
        assert_eq!(signatures.len(), 3);
        assert!(signatures.matches(&[0x00, 0xca, 0xfe, 0x00]));
        assert!(signatures.matches(&[0xde, 0xad, 0xbe, 0xef]));
        assert!(!signatures.matches(&[0xde, 0xad, 0xbe]));
        Ok(())
    }

    #[test]
    fn test_parse_list_rejects_bad_hex() {
        assert!(Signatures::parse_list("0xabc").is_err());
        assert!(Signatures::parse_list("zz").is_err());
        assert!(Signatures::parse_list("").map(|list| list.is_empty()).unwrap_or(false));
    }
}
