//! Static lookup tables for cosmetic and session-property tagging.
//!
//! Both tables are ordered and immutable after construction.  Matching is
//! deliberately string-based: cosmetic codes are matched against the raw
//! cosmetics descriptor and session properties against the serialized
//! property blob, so the policy stays data-driven and testable.

/// Cosmetic codes considered rare, in announcement priority order.
const RARE_COSMETICS: &[(&str, &str)] = &[
    ("LBAAD.", "Administrator"),
    ("LBAAK.", "Forest Guide"),
    ("LBADE.", "Finger Painter"),
    ("LBAGS.", "Illustrator"),
    ("LMAPY.", "Forest Guide"),
    ("LBANI.", "AA Creator"),
];

/// Session-property substrings, first match wins.
const SESSION_PROPERTIES: &[(&str, &str)] = &[("genesis", "<color=cyan>[GENESIS]</color>")];

/// Ordered map from cosmetic-item code to rarity label.
#[derive(Debug, Clone)]
pub struct RarityTable {
    entries: Vec<(String, String)>,
}

impl RarityTable {
    pub fn builtin() -> Self {
        Self::new(RARE_COSMETICS.iter().map(|&(c, l)| (c, l)))
    }

    pub fn new<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|(c, l)| (c.to_string(), l.to_string()))
                .collect(),
        }
    }

    /// Labels for every table code present as a comma-separated token of the
    /// descriptor, in table order.  Duplicate codes yield duplicate labels.
    pub fn token_matches(&self, cosmetics: &str) -> Vec<&str> {
        let tokens: Vec<String> = cosmetics
            .split(',')
            .map(|t| t.trim().to_uppercase())
            .filter(|t| !t.is_empty())
            .collect();

        self.entries
            .iter()
            .filter(|(code, _)| tokens.iter().any(|t| t == code))
            .map(|(_, label)| label.as_str())
            .collect()
    }

    /// First table entry whose code occurs anywhere in the raw descriptor.
    pub fn first_substring_match(&self, cosmetics: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(code, _)| cosmetics.contains(code.as_str()))
            .map(|(_, label)| label.as_str())
    }
}

/// Ordered list of (substring, label) pairs over the session-property blob.
#[derive(Debug, Clone)]
pub struct PropertyTable {
    entries: Vec<(String, String)>,
}

impl PropertyTable {
    pub fn builtin() -> Self {
        Self::new(SESSION_PROPERTIES.iter().map(|&(s, l)| (s, l)))
    }

    pub fn new<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|(s, l)| (s.to_string(), l.to_string()))
                .collect(),
        }
    }

    /// First-match-wins lookup in table order.
    pub fn first_match(&self, session_props: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(needle, _)| session_props.contains(needle.as_str()))
            .map(|(_, label)| label.as_str())
    }
}

/// The two tables bundled for the renderer and the notification gate.
#[derive(Debug, Clone)]
pub struct RuleTables {
    pub rarity: RarityTable,
    pub properties: PropertyTable,
}

impl RuleTables {
    pub fn builtin() -> Self {
        Self {
            rarity: RarityTable::builtin(),
            properties: PropertyTable::builtin(),
        }
    }
}

impl Default for RuleTables {
    fn default() -> Self {
        Self::builtin()
    }
}
