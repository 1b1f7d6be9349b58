// SPDX-License-Identifier: MPL-2.0

#[expect(dead_code)]
mod common;

use std::{sync::Arc, thread};

use aster_xdma::{
    AccessMode, CreationFlags, DmaDirection, Errno, Error, OpenFlags, SeekFrom, error::ENGINE_BUSY,
    read_write,
};
use common::{Outcome, c2h_mm, h2c_mm, new_cdev};

const BUF: usize = 0x7000_0000;

#[test]
fn write_advances_offset_by_bytes_transferred() {
    let (cdev, submitter) = new_cdev(h2c_mm());
    let file = cdev.open(AccessMode::O_WRONLY.into()).unwrap();

    assert_eq!(file.write(BUF, 100).unwrap(), 100);
    assert_eq!(file.offset(), 100);

    let params = submitter.last_transfer();
    assert_eq!(params.buf, BUF);
    assert_eq!(params.length, 100);
    assert_eq!(params.ep_addr, 0);
    assert_eq!(params.dir, DmaDirection::ToDevice);

    assert_eq!(file.write(BUF, 28).unwrap(), 28);
    assert_eq!(submitter.last_transfer().ep_addr, 100);
    assert_eq!(file.offset(), 128);
}

#[test]
fn short_transfer_is_a_success() {
    let (cdev, submitter) = new_cdev(c2h_mm());
    let file = cdev.open(AccessMode::O_RDONLY.into()).unwrap();
    submitter.set_outcome(Outcome::Short(10));

    assert_eq!(file.read(BUF, 64).unwrap(), 10);
    assert_eq!(file.offset(), 10);

    submitter.set_outcome(Outcome::Short(0));
    assert_eq!(file.read(BUF, 64).unwrap(), 0);
    assert_eq!(file.offset(), 10);
}

#[test]
fn fixed_address_mode_keeps_offset() {
    let (cdev, submitter) = new_cdev(h2c_mm());
    let file = cdev
        .open(OpenFlags::new(AccessMode::O_WRONLY, CreationFlags::O_TRUNC))
        .unwrap();
    file.seek(SeekFrom::Start(0x40)).unwrap();

    for _ in 0..3 {
        assert_eq!(file.write(BUF, 4).unwrap(), 4);
        assert_eq!(submitter.last_transfer().ep_addr, 0x40);
        assert_eq!(file.offset(), 0x40);
    }
}

#[test]
fn streaming_ignores_offset() {
    let (cdev, submitter) = new_cdev(c2h_mm().streaming(true));
    let file = cdev.open(AccessMode::O_RDONLY.into()).unwrap();

    assert_eq!(file.read(BUF, 256).unwrap(), 256);
    assert_eq!(submitter.last_transfer().ep_addr, 0);
    assert_eq!(file.offset(), 0);

    assert_eq!(file.read_at(16, BUF, 8).unwrap_err().error(), Errno::ESPIPE);
}

#[test]
fn positional_io_leaves_file_offset() {
    let (cdev, submitter) = new_cdev(c2h_mm());
    let file = cdev.open(AccessMode::O_RDONLY.into()).unwrap();

    assert_eq!(file.read_at(0x2000, BUF, 32).unwrap(), 32);
    assert_eq!(submitter.last_transfer().ep_addr, 0x2000);
    assert_eq!(file.offset(), 0);
}

#[test]
fn submitter_error_is_propagated_and_releases_busy() {
    let (cdev, submitter) = new_cdev(h2c_mm());
    let file = cdev.open(AccessMode::O_WRONLY.into()).unwrap();
    let failure = Error::with_message(Errno::EIO, "descriptor error");
    submitter.set_outcome(Outcome::Fail(failure));

    let err = file.write(BUF, 64).unwrap_err();
    assert_eq!(err, failure);
    assert_eq!(err.to_return_value(), -5);
    assert_eq!(file.offset(), 0);
    assert!(!cdev.engine().is_busy());

    submitter.set_outcome(Outcome::Full);
    assert_eq!(file.write(BUF, 64).unwrap(), 64);
}

#[test]
fn wrong_direction_is_rejected_by_the_file() {
    let (cdev, submitter) = new_cdev(h2c_mm());
    let file = cdev.open(AccessMode::O_WRONLY.into()).unwrap();

    assert_eq!(file.read(BUF, 8).unwrap_err().error(), Errno::EBADF);
    assert_eq!(file.read_at(0, BUF, 8).unwrap_err().error(), Errno::EBADF);
    assert_eq!(submitter.transfer_count(), 0);
}

#[test]
fn transfer_while_busy_is_rejected_immediately() {
    let (cdev, submitter) = new_cdev(c2h_mm().addr_align(4));
    let file = cdev.open(AccessMode::O_RDONLY.into()).unwrap();
    let gate = submitter.hold();

    let reader = {
        let file = file.clone();
        thread::spawn(move || file.read(BUF, 64))
    };
    gate.wait_entered();

    assert_eq!(file.read(BUF, 64).unwrap_err(), ENGINE_BUSY);
    assert_eq!(submitter.transfer_count(), 1);

    gate.open();
    assert_eq!(reader.join().unwrap().unwrap(), 64);
    assert_eq!(file.offset(), 64);
    assert!(!cdev.engine().is_busy());
}

#[test]
fn concurrent_transfers_never_overlap() {
    const THREADS: usize = 8;
    const ROUNDS: usize = 200;

    let (cdev, submitter) = new_cdev(h2c_mm());
    let file = cdev.open(AccessMode::O_WRONLY.into()).unwrap();

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let file = file.clone();
            thread::spawn(move || {
                let mut done = 0;
                for _ in 0..ROUNDS {
                    match file.write(BUF, 1) {
                        Ok(n) => done += n,
                        Err(err) => assert_eq!(err, ENGINE_BUSY),
                    }
                }
                done
            })
        })
        .collect();
    let done: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();

    assert_eq!(submitter.max_active.load(std::sync::atomic::Ordering::SeqCst), 1);
    assert_eq!(done, submitter.transfer_count());
    assert_eq!(file.offset(), done);
}

#[test]
fn read_write_drives_an_explicit_position() {
    let (cdev, submitter) = new_cdev(h2c_mm());
    let engine = Arc::clone(cdev.engine());
    let mut pos = 0x100;

    assert_eq!(read_write(&engine, submitter.as_ref(), BUF, 16, &mut pos).unwrap(), 16);
    assert_eq!(pos, 0x110);
    assert_eq!(submitter.last_transfer().ep_addr, 0x100);
}

#[test]
fn seek_follows_char_device_rules() {
    let (cdev, _) = new_cdev(c2h_mm());
    let file = cdev.open(AccessMode::O_RDONLY.into()).unwrap();

    assert_eq!(file.seek(SeekFrom::Start(100)).unwrap(), 100);
    assert_eq!(file.seek(SeekFrom::Current(-40)).unwrap(), 60);
    assert_eq!(file.seek(SeekFrom::End(8)).unwrap(), 8);
    assert_eq!(
        file.seek(SeekFrom::Current(-9)).unwrap_err().error(),
        Errno::EINVAL
    );
    assert_eq!(file.offset(), 8);
}

#[test]
fn positional_io_stays_within_file_offsets() {
    let (cdev, submitter) = new_cdev(h2c_mm());
    let file = cdev.open(AccessMode::O_WRONLY.into()).unwrap();
    let max = isize::MAX as usize;

    let err = file.write_at(usize::MAX, BUF, 16).unwrap_err();
    assert_eq!(err.error(), Errno::EINVAL);
    let err = file.write_at(max - 8, BUF, 16).unwrap_err();
    assert_eq!(err.error(), Errno::EOVERFLOW);
    assert_eq!(submitter.transfer_count(), 0);
    assert!(!cdev.engine().is_busy());

    assert_eq!(file.write_at(max - 16, BUF, 16).unwrap(), 16);
    assert_eq!(submitter.last_transfer().ep_addr, (max - 16) as u64);
    assert_eq!(file.offset(), 0);
}

#[test]
fn write_never_moves_offset_past_the_maximum() {
    let (cdev, submitter) = new_cdev(h2c_mm());
    let file = cdev.open(AccessMode::O_WRONLY.into()).unwrap();
    let max = isize::MAX as usize;

    file.seek(SeekFrom::Start(max)).unwrap();
    let err = file.write(BUF, 16).unwrap_err();
    assert_eq!(err.error(), Errno::EOVERFLOW);
    assert_eq!(submitter.transfer_count(), 0);
    assert_eq!(file.seek(SeekFrom::Current(0)).unwrap(), max);

    file.seek(SeekFrom::Start(max - 16)).unwrap();
    assert_eq!(file.write(BUF, 16).unwrap(), 16);
    assert_eq!(file.offset(), max);
    assert_eq!(file.seek(SeekFrom::Current(-16)).unwrap(), max - 16);
    file.seek(SeekFrom::Start(max)).unwrap();
    assert_eq!(
        file.seek(SeekFrom::Current(1)).unwrap_err().error(),
        Errno::EOVERFLOW
    );
}

#[test]
fn read_write_checks_position_range_only_on_mm_engines() {
    let (cdev, submitter) = new_cdev(h2c_mm());
    let mut pos = usize::MAX;
    let err = read_write(cdev.engine(), submitter.as_ref(), BUF, 16, &mut pos).unwrap_err();
    assert_eq!(err.error(), Errno::EINVAL);
    assert_eq!(pos, usize::MAX);

    let (cdev, submitter) = new_cdev(c2h_mm().streaming(true));
    let mut pos = usize::MAX;
    assert_eq!(
        read_write(cdev.engine(), submitter.as_ref(), BUF, 16, &mut pos).unwrap(),
        16
    );
    assert_eq!(pos, usize::MAX);
}
