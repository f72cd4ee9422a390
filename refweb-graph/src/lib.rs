pub mod assemble;
pub mod corpus;
pub mod error;
pub mod graph;
pub mod model;
pub mod scale;
pub mod traversal;

pub use assemble::{AssembleOptions, GraphAssembler};
pub use corpus::Corpus;
pub use error::CorpusError;
pub use graph::{CommentNode, DocumentNode, Edge, EdgeLabel, Graph, Node, NodeKind};
pub use model::{Comment, Document, User};
pub use scale::{DocumentSizes, Easing, SizeScaler, SizeTable};
pub use traversal::{Direction, Neighborhood, traverse};
