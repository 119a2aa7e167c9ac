mod boundaries;
mod grid;
