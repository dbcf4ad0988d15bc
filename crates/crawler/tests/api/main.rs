mod fetcher;
mod helpers;
mod pipeline;
