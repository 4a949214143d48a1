mod prepare;
pub use prepare::prepare_documents;

mod distribute;
pub use distribute::distribute_work;

mod validate;
pub use validate::validate_memory_operation;

mod object;
pub use object::{batch_objects, create_memory_object_with_document_references};

pub mod legacy;
