mod analyzer;
mod support;
