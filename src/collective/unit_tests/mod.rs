#[cfg(test)]
mod broadcast_tests;
#[cfg(test)]
mod ring_tests;
