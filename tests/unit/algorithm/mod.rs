mod adjacency;
mod boundary;
mod executor;
