pub mod capture;
pub mod device;
pub mod encoder;
pub mod file;

pub use capture::{AudioCaptureSession, CaptureState};
pub use device::{AudioFragment, CaptureConfig, CaptureDevice, Microphone, UnavailableMicrophone};
pub use encoder::{decode_wav, encode_wav, DecodedAudio};
pub use file::{AudioFile, FileMicrophone};
