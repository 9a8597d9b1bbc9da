pub mod stream_controller;
