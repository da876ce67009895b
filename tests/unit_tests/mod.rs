mod matrix;
mod mesh;
mod partition;
mod sparsity;
