pub mod local_offset;
