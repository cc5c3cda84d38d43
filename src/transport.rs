use anyhow::Result;
use log::info;
use std::fs::File;
use std::fs::OpenOptions;
use std::io::Write;
use std::os::unix::io::AsRawFd;
use std::thread;
use std::time::Duration;
use thiserror::Error;

// The board needs a short gap between frames before it accepts the next one.
const FRAME_SETTLE: Duration = Duration::from_millis(10);

#[derive(Debug, Error)]
#[error("Failed to set up serial device '{device}': {message}")]
pub struct SerialOpenError {
    device: String,
    message: String,
    #[source]
    source: Option<std::io::Error>,
}

impl SerialOpenError {
    pub fn from_io_error<S: Into<String>>(device: S, source: std::io::Error) -> Self {
        Self {
            device: device.into(),
            message: format!("{}", source),
            source: Some(source),
        }
    }
}

pub trait FrameSink {
    fn send(&mut self, frame: &[u8; 4]) -> Result<()>;
}

pub struct SerialSink {
    device: File,
}

impl SerialSink {
    pub fn open(device: &str) -> Result<SerialSink, SerialOpenError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(device)
            .map_err(|e| SerialOpenError::from_io_error(device, e))?;
        configure_raw(&file).map_err(|e| SerialOpenError::from_io_error(device, e))?;
        Ok(SerialSink { device: file })
    }
}

impl FrameSink for SerialSink {
    fn send(&mut self, frame: &[u8; 4]) -> Result<()> {
        self.device.write_all(frame)?;
        self.device.flush()?;
        thread::sleep(FRAME_SETTLE);
        Ok(())
    }
}

// Raw 115200 8N1, the board's fixed line settings.
fn configure_raw(file: &File) -> Result<(), std::io::Error> {
    let fd = file.as_raw_fd();
    unsafe {
        let mut termios: libc::termios = std::mem::zeroed();
        if libc::tcgetattr(fd, &mut termios) != 0 {
            return Err(std::io::Error::last_os_error());
        }
        libc::cfmakeraw(&mut termios);
        if libc::cfsetispeed(&mut termios, libc::B115200) != 0 {
            return Err(std::io::Error::last_os_error());
        }
        if libc::cfsetospeed(&mut termios, libc::B115200) != 0 {
            return Err(std::io::Error::last_os_error());
        }
        termios.c_cflag |= libc::CLOCAL | libc::CREAD;
        if libc::tcsetattr(fd, libc::TCSANOW, &termios) != 0 {
            return Err(std::io::Error::last_os_error());
        }
    }
    Ok(())
}

pub struct ConsoleSink {}

impl ConsoleSink {
    pub fn new() -> ConsoleSink {
        ConsoleSink {}
    }
}

impl FrameSink for ConsoleSink {
    fn send(&mut self, frame: &[u8; 4]) -> Result<()> {
        info!("Would send frame '{:02X?}'", frame);
        Ok(())
    }
}

#[cfg(test)]
pub mod mock {
    use super::FrameSink;

    use anyhow::Result;
    use std::cell::RefCell;
    use std::rc::Rc;

    pub struct MockSink {
        frames: Rc<RefCell<Vec<[u8; 4]>>>,
    }

    impl MockSink {
        pub fn new() -> (MockSink, Rc<RefCell<Vec<[u8; 4]>>>) {
            let frames = Rc::new(RefCell::new(Vec::new()));
            let sink = MockSink {
                frames: frames.clone(),
            };
            (sink, frames)
        }
    }

    impl FrameSink for MockSink {
        fn send(&mut self, frame: &[u8; 4]) -> Result<()> {
            self.frames.borrow_mut().push(*frame);
            Ok(())
        }
    }
}
