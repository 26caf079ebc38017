use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use std::sync::Mutex;

/// Runs the command with stdout and stderr merged onto our stdout and duplicated into `log_path`.
/// Console output is written first, so a slow or failing log never holds it back.
pub fn run_tee(mut command: Command, log_path: &Path) -> io::Result<ExitStatus> {
    let log = Mutex::new(File::create(log_path)?);
    let console = Mutex::new(io::stdout());

    let mut child = command
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;
    let stdout = child.stdout.take()
        .ok_or_else(|| io::Error::other("child stdout was not captured"))?;
    let stderr = child.stderr.take()
        .ok_or_else(|| io::Error::other("child stderr was not captured"))?;

    let copy_result = std::thread::scope(|scope| {
        let out_handle = scope.spawn(|| tee_stream(stdout, &console, &log));
        let err_handle = scope.spawn(|| tee_stream(stderr, &console, &log));
        let out = out_handle.join()
            .unwrap_or_else(|_| Err(io::Error::other("stdout tee thread panicked")));
        let err = err_handle.join()
            .unwrap_or_else(|_| Err(io::Error::other("stderr tee thread panicked")));
        out.and(err)
    });

    // always reap the child, even if copying failed part way
    let status = child.wait()?;
    copy_result?;
    Ok(status)
}

/// Copies everything from `reader` into both writers, chunk by chunk.
/// A log write failure stops further log writes but the console keeps receiving output; the error is returned at the end.
pub fn tee_stream<R, C, L>(mut reader: R, console: &Mutex<C>, log: &Mutex<L>) -> io::Result<()>
where
    R: Read,
    C: Write,
    L: Write
{
    let mut buffer = [0u8; 8192];
    let mut log_error: Option<io::Error> = None;
    loop {
        let n = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e)
        };
        let chunk = &buffer[..n];

        {
            let mut console = console.lock()
                .map_err(|_| io::Error::other("console lock poisoned"))?;
            console.write_all(chunk)?;
            console.flush()?;
        }

        if log_error.is_none() {
            let write_result = match log.lock() {
                Ok(mut file) => file.write_all(chunk).and_then(|()| file.flush()),
                Err(_) => Err(io::Error::other("log lock poisoned"))
            };
            if let Err(e) = write_result {
                log_error = Some(e);
            }
        }
    }

    match log_error {
        Some(e) => Err(e),
        None => Ok(())
    }
}
