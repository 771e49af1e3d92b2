//! URL query parsing for the editor entry point
//!
//! Reads `location.search`-style strings and turns the `tutorial` parameter
//! into a dispatch on a [`TutorialDispatch`].

use url::form_urlencoded;

/// Query parameter naming the tutorial to open
pub const TUTORIAL_PARAM: &str = "tutorial";

/// `tutorial` value that opens the tips library instead of a single deck
pub const ALL_TUTORIALS: &str = "all";

/// Parsed query parameters, in order of appearance
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    /// Parse a query string. A leading `?` is ignored.
    pub fn parse(search: &str) -> Self {
        let query = search.strip_prefix('?').unwrap_or(search);
        let pairs = form_urlencoded::parse(query.as_bytes())
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();
        Self { pairs }
    }

    /// First value for `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Every value for `key`
    pub fn get_all(&self, key: &str) -> Vec<&str> {
        self.pairs
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.pairs.iter().any(|(k, _)| k == key)
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// What the `tutorial` parameter asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TutorialRequest {
    /// Open the tips library
    OpenLibrary,
    /// Open the deck with this id
    Deck(String),
}

impl TutorialRequest {
    pub fn from_params(params: &QueryParams) -> Option<Self> {
        let value = params.get(TUTORIAL_PARAM)?.trim();
        if value.is_empty() {
            return None;
        }
        if value.eq_ignore_ascii_case(ALL_TUTORIALS) {
            Some(TutorialRequest::OpenLibrary)
        } else {
            Some(TutorialRequest::Deck(value.to_string()))
        }
    }
}

/// Receives the actions a query asks for
pub trait TutorialDispatch {
    /// Show the tips library
    fn open_tips_library(&mut self);

    /// Switch the tips panel to a tutorial deck
    fn update_deck(&mut self, tutorial_id: &str);
}

/// Parses the query once and dispatches what it asks for
#[derive(Debug, Clone)]
pub struct QueryParser {
    params: QueryParams,
    request: Option<TutorialRequest>,
}

impl QueryParser {
    pub fn new(search: &str) -> Self {
        let params = QueryParams::parse(search);
        let request = TutorialRequest::from_params(&params);
        Self { params, request }
    }

    /// Parameters for the wrapped view
    pub fn params(&self) -> &QueryParams {
        &self.params
    }

    pub fn request(&self) -> Option<&TutorialRequest> {
        self.request.as_ref()
    }

    /// Issue at most one dispatch. Returns whether anything was dispatched.
    pub fn apply<D: TutorialDispatch + ?Sized>(&self, dispatch: &mut D) -> bool {
        match &self.request {
            Some(TutorialRequest::OpenLibrary) => {
                log::debug!("Query requested the tips library");
                dispatch.open_tips_library();
                true
            }
            Some(TutorialRequest::Deck(id)) => {
                log::debug!("Query requested tutorial deck {}", id);
                dispatch.update_deck(id);
                true
            }
            None => false,
        }
    }
}
