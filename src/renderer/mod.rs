pub mod skinning;

pub use skinning::{BoneBufferSink, GpuStorageBuffer, SkinningBuffers, grown_capacity};
