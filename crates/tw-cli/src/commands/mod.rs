pub mod bestiary;
pub mod play;
pub mod roll;
