//! Worksheet and workbook protection: the options Excel exposes in its
//! "Protect Sheet" dialog and the two password hash schemes it accepts.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rand::RngCore;
use sha2::{Digest, Sha512};

use crate::xml::XmlWriter;

const SPIN_COUNT: u32 = 100_000;

/// What a user may still do on a protected sheet. The defaults match the
/// dialog: only selecting cells is allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtectionOptions {
    pub select_locked_cells: bool,
    pub select_unlocked_cells: bool,
    pub format_cells: bool,
    pub format_columns: bool,
    pub format_rows: bool,
    pub insert_columns: bool,
    pub insert_rows: bool,
    pub insert_hyperlinks: bool,
    pub delete_columns: bool,
    pub delete_rows: bool,
    pub sort: bool,
    pub use_autofilter: bool,
    pub use_pivot_tables: bool,
    pub edit_scenarios: bool,
    pub edit_objects: bool,
}

impl Default for ProtectionOptions {
    fn default() -> Self {
        Self {
            select_locked_cells: true,
            select_unlocked_cells: true,
            format_cells: false,
            format_columns: false,
            format_rows: false,
            insert_columns: false,
            insert_rows: false,
            insert_hyperlinks: false,
            delete_columns: false,
            delete_rows: false,
            sort: false,
            use_autofilter: false,
            use_pivot_tables: false,
            edit_scenarios: false,
            edit_objects: false,
        }
    }
}

/// A stored password, either the 16-bit legacy hash or a salted SHA-512.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PasswordHash {
    Legacy(u16),
    Sha512 {
        hash: String,
        salt: String,
        spin_count: u32,
    },
}

impl PasswordHash {
    pub(crate) fn legacy(password: &str) -> Self {
        PasswordHash::Legacy(legacy_password_hash(password))
    }

    /// Salted SHA-512 with a fresh random salt.
    pub(crate) fn sha512(password: &str) -> Self {
        let mut salt = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut salt);
        Self::sha512_with_salt(password, &salt, SPIN_COUNT)
    }

    pub(crate) fn sha512_with_salt(password: &str, salt: &[u8], spin_count: u32) -> Self {
        PasswordHash::Sha512 {
            hash: sha512_password_hash(password, salt, spin_count),
            salt: STANDARD.encode(salt),
            spin_count,
        }
    }
}

/// Excel's legacy worksheet password verifier.
pub fn legacy_password_hash(password: &str) -> u16 {
    let bytes = password.as_bytes();
    let mut hash: u16 = 0;
    for &byte in bytes.iter().rev() {
        hash = ((hash >> 14) & 0x01) | ((hash << 1) & 0x7FFF);
        hash ^= byte as u16;
    }
    hash = ((hash >> 14) & 0x01) | ((hash << 1) & 0x7FFF);
    hash ^= bytes.len() as u16;
    hash ^ 0xCE4B
}

/// ISO/IEC 29500 agile password hash: SHA-512 over salt + UTF-16LE
/// password, then `spin_count` rounds of hash + little-endian counter.
pub fn sha512_password_hash(password: &str, salt: &[u8], spin_count: u32) -> String {
    let mut hasher = Sha512::new();
    hasher.update(salt);
    for unit in password.encode_utf16() {
        hasher.update(unit.to_le_bytes());
    }
    let mut digest = hasher.finalize();
    for i in 0..spin_count {
        let mut hasher = Sha512::new();
        hasher.update(digest);
        hasher.update(i.to_le_bytes());
        digest = hasher.finalize();
    }
    STANDARD.encode(digest)
}

/// `<sheetProtection>`. Each attribute names an action that is *blocked*,
/// so allowed actions are written as "0" and blocked defaults omitted.
pub(crate) fn write_sheet_protection(
    xml: &mut XmlWriter,
    options: &ProtectionOptions,
    password: Option<&PasswordHash>,
) {
    let mut attrs: Vec<(&str, String)> = Vec::new();
    match password {
        Some(PasswordHash::Sha512 { hash, salt, spin_count }) => {
            attrs.push(("algorithmName", "SHA-512".to_string()));
            attrs.push(("hashValue", hash.clone()));
            attrs.push(("saltValue", salt.clone()));
            attrs.push(("spinCount", spin_count.to_string()));
        }
        Some(PasswordHash::Legacy(hash)) => attrs.push(("password", format!("{:X}", hash))),
        None => {}
    }
    attrs.push(("sheet", "1".to_string()));
    if !options.edit_objects {
        attrs.push(("objects", "1".to_string()));
    }
    if !options.edit_scenarios {
        attrs.push(("scenarios", "1".to_string()));
    }
    let allowed = [
        ("formatCells", options.format_cells),
        ("formatColumns", options.format_columns),
        ("formatRows", options.format_rows),
        ("insertColumns", options.insert_columns),
        ("insertRows", options.insert_rows),
        ("insertHyperlinks", options.insert_hyperlinks),
        ("deleteColumns", options.delete_columns),
        ("deleteRows", options.delete_rows),
    ];
    for (name, on) in allowed {
        if on {
            attrs.push((name, "0".to_string()));
        }
    }
    if !options.select_locked_cells {
        attrs.push(("selectLockedCells", "1".to_string()));
    }
    if options.sort {
        attrs.push(("sort", "0".to_string()));
    }
    if options.use_autofilter {
        attrs.push(("autoFilter", "0".to_string()));
    }
    if options.use_pivot_tables {
        attrs.push(("pivotTables", "0".to_string()));
    }
    if !options.select_unlocked_cells {
        attrs.push(("selectUnlockedCells", "1".to_string()));
    }
    let attrs: Vec<(&str, &str)> = attrs.iter().map(|(k, v)| (*k, v.as_str())).collect();
    xml.empty_with("sheetProtection", &attrs);
}

/// `<workbookProtection>` locking the sheet structure (and optionally the
/// window layout).
pub(crate) fn write_workbook_protection(
    xml: &mut XmlWriter,
    password: Option<&PasswordHash>,
    lock_windows: bool,
) {
    let mut attrs: Vec<(&str, String)> = Vec::new();
    match password {
        Some(PasswordHash::Sha512 { hash, salt, spin_count }) => {
            attrs.push(("workbookAlgorithmName", "SHA-512".to_string()));
            attrs.push(("workbookHashValue", hash.clone()));
            attrs.push(("workbookSaltValue", salt.clone()));
            attrs.push(("workbookSpinCount", spin_count.to_string()));
        }
        Some(PasswordHash::Legacy(hash)) => attrs.push(("workbookPassword", format!("{:X}", hash))),
        None => {}
    }
    attrs.push(("lockStructure", "1".to_string()));
    if lock_windows {
        attrs.push(("lockWindows", "1".to_string()));
    }
    let attrs: Vec<(&str, &str)> = attrs.iter().map(|(k, v)| (*k, v.as_str())).collect();
    xml.empty_with("workbookProtection", &attrs);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_hash_known_values() {
        assert_eq!(format!("{:X}", legacy_password_hash("password")), "83AF");
        assert_eq!(format!("{:X}", legacy_password_hash("")), "CE4B");
    }

    #[test]
    fn test_sha512_is_deterministic_for_fixed_salt() {
        let salt = [7u8; 16];
        let a = sha512_password_hash("secret", &salt, 10);
        let b = sha512_password_hash("secret", &salt, 10);
        let c = sha512_password_hash("Secret", &salt, 10);
        assert_eq!(a, b);
        assert_ne!(a, c);
        // 64 byte digest, base64 encoded.
        assert_eq!(a.len(), 88);
    }

    #[test]
    fn test_random_salts_differ() {
        let (PasswordHash::Sha512 { salt: s1, .. }, PasswordHash::Sha512 { salt: s2, .. }) =
            (PasswordHash::sha512("pw"), PasswordHash::sha512("pw"))
        else {
            panic!("expected SHA-512 hashes");
        };
        assert_ne!(s1, s2);
    }

    #[test]
    fn test_sheet_protection_attributes() {
        let mut xml = XmlWriter::new();
        let options = ProtectionOptions {
            format_cells: true,
            select_unlocked_cells: false,
            ..ProtectionOptions::default()
        };
        write_sheet_protection(&mut xml, &options, Some(&PasswordHash::legacy("password")));
        assert_eq!(
            xml.into_string(),
            "<sheetProtection password=\"83AF\" sheet=\"1\" objects=\"1\" scenarios=\"1\" formatCells=\"0\" selectUnlockedCells=\"1\"/>"
        );
    }
}
