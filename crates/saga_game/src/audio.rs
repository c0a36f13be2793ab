//! Cutscene soundtracks.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use rodio::{Decoder, OutputStream, Sink};

/// A soundtrack played alongside a cutscene clip.
pub trait AudioTrack {
    fn play(&mut self);

    fn set_volume(&mut self, volume: f32);

    fn stop(&mut self);
}

/// Soundtrack decoded by rodio onto the default output device.
pub struct RodioTrack {
    // Dropping the stream silences the sink.
    _stream: OutputStream,
    sink: Sink,
}

impl RodioTrack {
    /// Decode `path` into a paused sink. Playback starts on `play`.
    pub fn open(path: &Path) -> Result<Self, String> {
        let file = File::open(path)
            .map_err(|e| format!("failed to open soundtrack '{}': {}", path.display(), e))?;
        let source = Decoder::new(BufReader::new(file))
            .map_err(|e| format!("failed to decode soundtrack '{}': {}", path.display(), e))?;
        let (stream, handle) =
            OutputStream::try_default().map_err(|e| format!("no audio output device: {}", e))?;
        let sink = Sink::try_new(&handle).map_err(|e| format!("failed to create sink: {}", e))?;
        sink.pause();
        sink.append(source);
        Ok(Self {
            _stream: stream,
            sink,
        })
    }
}

impl AudioTrack for RodioTrack {
    fn play(&mut self) {
        self.sink.play();
    }

    fn set_volume(&mut self, volume: f32) {
        self.sink.set_volume(volume);
    }

    fn stop(&mut self) {
        self.sink.stop();
    }
}
