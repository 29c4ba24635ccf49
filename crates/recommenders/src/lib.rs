//! # Recommenders Crate
//!
//! The three standalone recommendation strategies.
//!
//! ## Components
//!
//! ### Popularity
//! Bayesian-smoothed average rating per movie. Needs no user history, so
//! it is also the fallback when the other strategies have nothing to say.
//!
//! ### Content
//! TF-IDF over each movie's title and genre tags. A user's taste profile is
//! the mean vector of the movies they liked; candidates are ranked by
//! cosine similarity to it.
//!
//! ### Collaborative
//! Latent factors fitted on the user×movie interaction matrix through the
//! `factorization` capability traits.
//!
//! ## Example Usage
//!
//! ```ignore
//! use recommenders::{collaborative, content, popularity};
//! use factorization::AlsFactorizer;
//!
//! let table = popularity::fit(index.ratings(), 50.0)?;
//! let top = popularity::recommend(&table, 10, &HashSet::new());
//!
//! let content_model = content::fit(index.movies(), &ContentConfig::default())?;
//! let similar = content::recommend(user_id, &index, &content_model, 10, 4.0)?;
//!
//! let cf_model = collaborative::fit(index.ratings(), &AlsFactorizer::new(), &CollaborativeConfig::default())?;
//! let cf = collaborative::recommend(user_id, &cf_model, 10, &seen)?;
//! ```
//!
//! Every `fit` is pure and meant to be called once per data snapshot; the
//! fitted models are immutable and `Send + Sync`.

// Public modules
pub mod types;
pub mod user_context;
pub mod popularity;
pub mod tfidf;
pub mod content;
pub mod collaborative;

// Re-export commonly used types
pub use types::{Algorithm, Candidate, UserContext};
pub use popularity::{PopularityConfig, PopularityEntry, PopularityTable};
pub use tfidf::{TfidfVectorizer, TfidfVocabulary};
pub use content::{ContentConfig, ContentModel};
pub use collaborative::{CollaborativeConfig, CollaborativeModel};
