use bstr::BString;

/// A blob object — opaque file content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    pub data: BString,
}

impl Blob {
    /// Create a blob from raw bytes.
    pub fn new(data: impl Into<BString>) -> Self {
        Self { data: data.into() }
    }

    /// Parse blob content (the content IS the data).
    pub fn parse(content: &[u8]) -> Self {
        Self {
            data: BString::from(content),
        }
    }

    /// Size of the content in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_preserves_bytes() {
        let blob = Blob::parse(b"\x00\xff binary \x01");
        assert_eq!(blob.data.as_slice(), b"\x00\xff binary \x01");
        assert_eq!(blob.size(), 11);
    }

    #[test]
    fn empty_blob() {
        let blob = Blob::new(Vec::new());
        assert_eq!(blob.size(), 0);
    }
}
