//! In-memory dataset stores for the five content categories.
//!
//! Each category is parsed once at startup from a JSON blob embedded at
//! compile time and is immutable afterwards, so request handlers read the
//! collections without any locking. Only the random selector carries state
//! (a process-lifetime RNG seeded from the clock at construction).

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Embedded dataset blobs, compiled into the binary.
pub mod embedded {
    pub const QUOTES: &[u8] = include_bytes!("../data/quotes.json");
    pub const ANIME: &[u8] = include_bytes!("../data/anime.json");
    pub const CHUCKNORRIS: &[u8] = include_bytes!("../data/chucknorris.json");
    pub const DADJOKES: &[u8] = include_bytes!("../data/dadjokes.json");
    pub const PROGRAMMING: &[u8] = include_bytes!("../data/programming.json");
}

/// Errors raised by dataset loading and queries.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("failed to parse {category} dataset: {message}")]
    Parse {
        category: &'static str,
        message: String,
    },

    #[error("no items found in {0} dataset")]
    Empty(&'static str),

    #[error("no {0} items available")]
    NotLoaded(&'static str),

    #[error("{category} item with id {id} not found")]
    NotFound { category: &'static str, id: u32 },
}

/// One unit of content (a quote or joke).
///
/// All categories share this shape: a stable numeric id plus a flat map of
/// named text fields (`quote`, `author`, `character`, `category`, ...).
/// The flattened map keeps field lookup uniform across categories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: u32,
    #[serde(flatten)]
    pub fields: BTreeMap<String, String>,
}

impl Item {
    /// Value of a named text field, if present.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

/// Immutable ordered collection of items for one category.
pub struct Dataset {
    category: &'static str,
    items: Vec<Item>,
    rng: Mutex<SmallRng>,
}

impl Dataset {
    /// Create an empty store for a category. The RNG is seeded from the
    /// system clock here, once per store, not per draw.
    pub fn new(category: &'static str) -> Self {
        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or_default();
        Self {
            category,
            items: Vec::new(),
            rng: Mutex::new(SmallRng::seed_from_u64(seed)),
        }
    }

    pub fn category(&self) -> &'static str {
        self.category
    }

    /// Parse a JSON array of items and replace the store's contents.
    ///
    /// A failed load leaves any previously loaded collection untouched.
    pub fn load(&mut self, raw: &[u8]) -> Result<(), DatasetError> {
        let parsed: Vec<Item> = serde_json::from_slice(raw).map_err(|err| DatasetError::Parse {
            category: self.category,
            message: err.to_string(),
        })?;

        if parsed.is_empty() {
            return Err(DatasetError::Empty(self.category));
        }

        self.items = parsed;
        Ok(())
    }

    /// Uniformly random item from the loaded collection.
    pub fn random_item(&self) -> Result<Item, DatasetError> {
        if self.items.is_empty() {
            return Err(DatasetError::NotLoaded(self.category));
        }

        let index = {
            let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            rng.random_range(0..self.items.len())
        };
        Ok(self.items[index].clone())
    }

    /// Item with the given id. Linear scan; first match wins.
    pub fn item_by_id(&self, id: u32) -> Result<Item, DatasetError> {
        self.items
            .iter()
            .find(|item| item.id == id)
            .cloned()
            .ok_or(DatasetError::NotFound {
                category: self.category,
                id,
            })
    }

    /// All items whose named field exactly equals `value` (case-sensitive).
    /// Zero matches yields an empty vector, not an error.
    pub fn items_by_field(&self, name: &str, value: &str) -> Vec<Item> {
        self.items
            .iter()
            .filter(|item| item.field(name) == Some(value))
            .cloned()
            .collect()
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn count(&self) -> usize {
        self.items.len()
    }
}

/// The five category stores, assembled once at startup.
pub struct Datasets {
    pub quotes: Dataset,
    pub anime: Dataset,
    pub chucknorris: Dataset,
    pub dadjokes: Dataset,
    pub programming: Dataset,
}

impl Datasets {
    /// Load every category from the embedded blobs. Any failure is fatal to
    /// startup; the process must not serve with a partial catalog.
    pub fn load_embedded() -> Result<Self, DatasetError> {
        let mut quotes = Dataset::new("quotes");
        quotes.load(embedded::QUOTES)?;

        let mut anime = Dataset::new("anime");
        anime.load(embedded::ANIME)?;

        let mut chucknorris = Dataset::new("chucknorris");
        chucknorris.load(embedded::CHUCKNORRIS)?;

        let mut dadjokes = Dataset::new("dadjokes");
        dadjokes.load(embedded::DADJOKES)?;

        let mut programming = Dataset::new("programming");
        programming.load(embedded::PROGRAMMING)?;

        Ok(Self {
            quotes,
            anime,
            chucknorris,
            dadjokes,
            programming,
        })
    }
}
