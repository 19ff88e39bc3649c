use crate::grammar::GrammarData;
use crate::{Grammar, GrammarError};

/// Leading magic bytes of a serialized grammar.
const MAGIC: [u8; 4] = *b"ALDG";

/// Version tag written after the magic bytes. Bumped on any change to the
/// table layout; older blobs are rejected rather than misread.
pub const FORMAT_VERSION: u16 = 1;

impl Grammar {
    /// Serializes the grammar into a versioned binary blob.
    pub fn to_bytes(&self) -> Result<Vec<u8>, GrammarError> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&MAGIC);
        bytes.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        bincode::serialize_into(&mut bytes, self.data())?;
        Ok(bytes)
    }

    /// Loads a grammar from a blob produced by [`Grammar::to_bytes`].
    ///
    /// The payload is validated the same way [`GrammarBuilder`] output is, so
    /// a corrupt or truncated blob fails here instead of at parse time.
    ///
    /// [`GrammarBuilder`]: crate::GrammarBuilder
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, GrammarError> {
        let payload = bytes.strip_prefix(&MAGIC).ok_or(GrammarError::BadMagic)?;
        let (version, payload) =
            payload.split_first_chunk::<2>().ok_or(GrammarError::BadMagic)?;
        let version = u16::from_le_bytes(*version);
        if version != FORMAT_VERSION {
            return Err(GrammarError::UnsupportedVersion {
                found: version,
                expected: FORMAT_VERSION,
            });
        }
        let data: GrammarData = bincode::deserialize(payload)?;
        Self::new(data)
    }
}
