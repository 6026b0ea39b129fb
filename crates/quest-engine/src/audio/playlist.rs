/// Background music tracks, played in order and looping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Playlist {
    tracks: Vec<String>,
    index: usize,
}

impl Playlist {
    pub fn new(tracks: Vec<String>) -> Self {
        Self { tracks, index: 0 }
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn current(&self) -> Option<&str> {
        self.tracks.get(self.index).map(String::as_str)
    }

    /// Step to the following track, looping after the last.
    pub fn next(&mut self) -> Option<&str> {
        if self.tracks.is_empty() {
            return None;
        }
        self.index = (self.index + 1) % self.tracks.len();
        self.current()
    }
}
