pub mod patch_ctx;
pub mod patch_flow;

pub use patch_ctx::{DocumentCtx, IdGenerator, SequentialIds};
pub use patch_flow::{DocumentPatch, PatchEngine};
