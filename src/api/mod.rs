pub mod azure;
pub mod cloudinary;
pub mod completion;
pub mod elevenlabs;
pub mod google_tts;
pub mod pexels;
