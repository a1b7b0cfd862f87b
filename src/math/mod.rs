pub mod tensor;
pub mod init;

pub use tensor::Tensor;
