mod animator;
mod collision;
mod keyframes;
mod pose;
mod tags;

pub use animator::*;
pub use keyframes::*;
pub use pose::*;
pub use tags::*;



#[cfg(test)]
mod animator_tests;


#[cfg(test)]
mod collision_tests;
