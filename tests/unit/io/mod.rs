mod error;
mod fits;
