//! End-to-end scenarios driving the subtrack engine through fake
//! collaborators.

#[cfg(test)]
mod fakes;

#[cfg(test)]
mod scan {
    mod integration;
}

#[cfg(test)]
mod monitor {
    mod integration;
}

#[cfg(test)]
mod history {
    mod integration;
}
