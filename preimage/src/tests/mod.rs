


// Chain and event tests
mod chains;
