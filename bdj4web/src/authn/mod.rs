pub mod shared_key;
