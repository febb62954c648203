pub mod ollama;
pub mod pexels;
pub mod pixabay;
pub mod speech;
pub mod youtube;
