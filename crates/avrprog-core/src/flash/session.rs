//! Write and verify sessions

use crate::device::DeviceProfile;
use crate::error::Result;
use crate::firmware::FirmwareImage;
use crate::programmer::IspTransport;
use crate::protocol::{self, ExtendedAddress};

use super::busy::{BusyWait, PollLimit};
use super::erase::erase_chip;
use super::guard::ResetGuard;
use super::page::{page_addresses, program_page, PageBuffer, PageOutcome};
use super::progress::WriteProgress;
use super::verify::{verify_range_with, VerifyOutcome};

/// Options for [`write_image`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOptions {
    /// Erase the chip before programming
    ///
    /// Pages can only be programmed from the erased state; turn this off
    /// only when the target is known to be blank.
    pub erase: bool,
    /// Read back and compare every segment after programming
    pub verify: bool,
    /// Bounds for waiting on page writes
    pub poll: PollLimit,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            erase: true,
            verify: false,
            poll: PollLimit::default(),
        }
    }
}

/// Result of a verification pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifyReport {
    /// Match, or the first mismatch within the segment at `segment_address`
    pub outcome: VerifyOutcome,
    /// Start address of the last segment compared
    pub segment_address: u32,
    /// Number of bytes that compared equal
    pub bytes_verified: usize,
}

impl VerifyReport {
    /// Whether every byte matched
    pub fn is_match(&self) -> bool {
        self.outcome.is_match()
    }

    /// Absolute byte address of the mismatch, if any
    pub fn mismatch_address(&self) -> Option<u32> {
        match self.outcome {
            VerifyOutcome::Match => None,
            VerifyOutcome::Mismatch { offset, .. } => Some(self.segment_address + offset),
        }
    }
}

/// Statistics from a write session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteReport {
    /// Number of image bytes programmed
    pub bytes_written: usize,
    /// Number of pages committed
    pub pages_written: usize,
    /// Number of pages skipped because they were entirely erased bytes
    pub pages_skipped: usize,
    /// Outcome of the verification pass, if one was requested
    pub verification: Option<VerifyReport>,
}

impl WriteReport {
    /// False only when verification ran and found a mismatch
    pub fn is_ok(&self) -> bool {
        self.verification.map_or(true, |v| v.is_match())
    }
}

/// Program an image into flash
///
/// 1. Check that the image fits (nothing is sent otherwise)
/// 2. Erase the chip, unless `options.erase` is false
/// 3. Enter programming mode once for the whole session
/// 4. Program each segment page by page in ascending address order
/// 5. Optionally verify each segment, stopping at the first mismatch
///
/// The target is released from reset on every exit path. A verification
/// mismatch is not an error; it is reported in
/// [`WriteReport::verification`].
pub fn write_image<T, P>(
    transport: &mut T,
    profile: &DeviceProfile,
    image: &FirmwareImage,
    options: &WriteOptions,
    progress: &mut P,
) -> Result<WriteReport>
where
    T: IspTransport + ?Sized,
    P: WriteProgress + ?Sized,
{
    profile.validate()?;
    image.check_capacity(profile.flash_size)?;

    if options.erase {
        progress.erasing(profile.flash_size as usize);
        erase_chip(transport, profile)?;
        progress.erase_complete();
    }

    let mut target = ResetGuard::enter(transport)?;
    protocol::enable_memory_access(&mut *target)?;
    let mut cache = ExtendedAddress::new();
    let busy = BusyWait::for_mode(profile.busy_mode, options.poll);

    // A page may only be committed once per erase
    let runs = image.coalesce(profile.page_size);
    let mut page = PageBuffer::new(profile.page_size)?;
    let mut report = WriteReport::default();

    progress.writing(runs.len());
    let mut written = 0usize;

    let count = runs.segments().len();
    for (index, segment) in runs.segments().iter().enumerate() {
        log::info!(
            "Writing segment {}/{} at 0x{:05X} ({} bytes)",
            index + 1,
            count,
            segment.address,
            segment.len()
        );

        for page_address in page_addresses(segment.address, segment.len(), profile.page_size) {
            page.fill(page_address, segment.address, &segment.data);
            match program_page(&mut *target, &mut cache, &busy, page.as_bytes(), page_address)? {
                PageOutcome::Written => report.pages_written += 1,
                PageOutcome::Skipped => report.pages_skipped += 1,
            }

            let page_end = (page_address as u64 + profile.page_size as u64).min(segment.end() as u64);
            progress.write_progress(written + (page_end - segment.address as u64) as usize);
        }
        written += segment.len();
    }
    report.bytes_written = image.len();

    if options.verify {
        report.verification = Some(verify_segments(&mut *target, &mut cache, image, progress)?);
    }

    target.release()?;
    progress.complete(&report);
    Ok(report)
}

/// Compare flash against an image without programming
///
/// Enters programming mode, verifies each segment in address order and
/// stops at the first mismatch.
pub fn verify_image<T, P>(
    transport: &mut T,
    profile: &DeviceProfile,
    image: &FirmwareImage,
    progress: &mut P,
) -> Result<VerifyReport>
where
    T: IspTransport + ?Sized,
    P: WriteProgress + ?Sized,
{
    image.check_capacity(profile.flash_size)?;

    let mut target = ResetGuard::enter(transport)?;
    protocol::enable_memory_access(&mut *target)?;
    let mut cache = ExtendedAddress::new();

    let report = verify_segments(&mut *target, &mut cache, image, progress)?;
    target.release()?;
    Ok(report)
}

fn verify_segments<T, P>(
    transport: &mut T,
    cache: &mut ExtendedAddress,
    image: &FirmwareImage,
    progress: &mut P,
) -> Result<VerifyReport>
where
    T: IspTransport + ?Sized,
    P: WriteProgress + ?Sized,
{
    progress.verifying(image.len());

    let mut report = VerifyReport {
        outcome: VerifyOutcome::Match,
        segment_address: image.start_address().unwrap_or(0),
        bytes_verified: 0,
    };

    for segment in image.segments() {
        let before = report.bytes_verified;
        report.segment_address = segment.address;
        report.outcome = verify_range_with(
            transport,
            cache,
            segment.address,
            &segment.data,
            &mut |n| progress.verify_progress(before + n),
        )?;

        match report.outcome {
            VerifyOutcome::Match => report.bytes_verified += segment.len(),
            VerifyOutcome::Mismatch {
                offset,
                expected,
                actual,
            } => {
                report.bytes_verified += offset as usize;
                log::warn!(
                    "Verification failed at 0x{:05X}: expected 0x{:02X}, read 0x{:02X}",
                    segment.address + offset,
                    expected,
                    actual
                );
                break;
            }
        }
    }

    Ok(report)
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;
    use crate::device::BusyMode;
    use crate::error::Error;
    use crate::firmware::Segment;
    use crate::flash::NoProgress;
    use crate::isp::opcodes;
    use crate::mock::MockTarget;
    use crate::programmer::Level;
    use alloc::vec;
    use alloc::vec::Vec;

    fn atmega328() -> DeviceProfile {
        DeviceProfile::new(0x8000, 128, 9000, BusyMode::ReadyBusyPoll)
    }

    fn page_frames(page_word: u32, page: &[u8], load_ext: bool) -> Vec<Vec<u8>> {
        let mut frames = Vec::new();
        for (i, pair) in page.chunks(2).enumerate() {
            frames.push(vec![0x40, 0x00, i as u8, pair[0]]);
            frames.push(vec![0x48, 0x00, i as u8, pair[1]]);
        }
        if load_ext {
            frames.push(vec![0x4D, 0x00, (page_word >> 16) as u8, 0x00]);
        }
        frames.push(vec![0x4C, (page_word >> 8) as u8, page_word as u8, 0x00]);
        frames.push(vec![0xF0, 0x00, 0x00, 0x00]);
        frames
    }

    #[test]
    fn test_130_byte_image_exact_frames() {
        let data: Vec<u8> = (0..130u32).map(|i| (i * 3 + 1) as u8).collect();
        let image = FirmwareImage::from_raw(data.clone(), 0);
        let mut target = MockTarget::new(0x8000);

        let report =
            write_image(&mut target, &atmega328(), &image, &WriteOptions::default(), &mut NoProgress)
                .unwrap();

        assert_eq!(report.pages_written, 2);
        assert_eq!(report.pages_skipped, 0);
        assert_eq!(report.bytes_written, 130);

        let mut page1 = vec![0xFF; 128];
        page1[..2].copy_from_slice(&data[128..]);

        let mut expected = vec![
            vec![0xAC, 0x53, 0x00, 0x00],
            vec![0xAC, 0x80, 0x00, 0x00],
            vec![0xAC, 0x53, 0x00, 0x00],
        ];
        expected.extend(page_frames(0, &data[..128], true));
        expected.extend(page_frames(64, &page1, false));
        assert_eq!(target.frames(), expected);

        assert_eq!(
            target.resets(),
            vec![Level::Low, Level::High, Level::Low, Level::High]
        );
        assert_eq!(&target.memory()[..130], &data[..]);
        assert!(target.memory()[130..].iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn test_image_filling_flash_exactly() {
        let image = FirmwareImage::from_raw(vec![0x00; 0x8000], 0);
        let mut target = MockTarget::new(0x8000);

        let report =
            write_image(&mut target, &atmega328(), &image, &WriteOptions::default(), &mut NoProgress)
                .unwrap();
        assert_eq!(report.pages_written, 256);
        assert!(target.memory().iter().all(|&b| b == 0x00));
    }

    #[test]
    fn test_oversized_image_sends_nothing() {
        let image = FirmwareImage::from_raw(vec![0x00; 0x8001], 0);
        let mut target = MockTarget::new(0x8000);

        let result =
            write_image(&mut target, &atmega328(), &image, &WriteOptions::default(), &mut NoProgress);
        assert_eq!(
            result,
            Err(Error::CapacityExceeded {
                image_end: 0x8001,
                flash_size: 0x8000
            })
        );
        assert!(target.events().is_empty());
    }

    #[test]
    fn test_erased_pages_are_skipped() {
        let mut data = vec![0xFF; 384];
        data[300] = 0x12;
        let image = FirmwareImage::from_raw(data, 0);
        let mut target = MockTarget::new(0x8000);
        let options = WriteOptions {
            erase: false,
            ..WriteOptions::default()
        };

        let report = write_image(&mut target, &atmega328(), &image, &options, &mut NoProgress).unwrap();
        assert_eq!(report.pages_written, 1);
        assert_eq!(report.pages_skipped, 2);
        assert_eq!(
            target.transmitted_with_opcode(opcodes::WRITE_PAGE),
            vec![vec![0x4C, 0x00, 0x80, 0x00]]
        );
        assert_eq!(target.memory()[300], 0x12);
    }

    #[test]
    fn test_two_segments_program_independently() {
        let image = FirmwareImage::from_segments(vec![
            Segment::new(0x0000, vec![0x11; 64]),
            Segment::new(0x1000, vec![0x22; 64]),
        ])
        .unwrap();
        let mut target = MockTarget::new(0x8000);
        let options = WriteOptions {
            erase: false,
            verify: true,
            ..WriteOptions::default()
        };

        let report = write_image(&mut target, &atmega328(), &image, &options, &mut NoProgress).unwrap();
        assert_eq!(report.pages_written, 2);
        assert!(report.is_ok());
        assert_eq!(
            target.transmitted_with_opcode(opcodes::WRITE_PAGE),
            vec![vec![0x4C, 0x00, 0x00, 0x00], vec![0x4C, 0x08, 0x00, 0x00]]
        );
        assert_eq!(target.transmitted_with_opcode(opcodes::LOAD_EXT_ADDR).len(), 1);
        assert!(target.memory()[0x1000..0x1040].iter().all(|&b| b == 0x22));
        assert!(target.memory()[0x40..0x1000].iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn test_segments_sharing_a_page_commit_once() {
        let image = FirmwareImage::from_segments(vec![
            Segment::new(0x00, vec![0x11; 16]),
            Segment::new(0x40, vec![0x22; 16]),
        ])
        .unwrap();
        let mut target = MockTarget::new(0x8000);
        let options = WriteOptions {
            erase: false,
            verify: true,
            ..WriteOptions::default()
        };

        let report = write_image(&mut target, &atmega328(), &image, &options, &mut NoProgress).unwrap();
        assert_eq!(report.pages_written, 1);
        assert_eq!(report.bytes_written, 32);
        assert!(report.is_ok());
        assert_eq!(target.transmitted_with_opcode(opcodes::WRITE_PAGE).len(), 1);
    }

    #[test]
    fn test_verify_mismatch_releases_reset() {
        let image = FirmwareImage::from_raw(vec![0xA5; 130], 0);
        let mut target = MockTarget::new(0x8000);
        // A cell that cannot be programmed back to 1s without an erase
        target.memory_mut()[70] = 0x00;
        target.memory_mut()[100] = 0x00;
        let options = WriteOptions {
            erase: false,
            verify: true,
            ..WriteOptions::default()
        };

        let report = write_image(&mut target, &atmega328(), &image, &options, &mut NoProgress).unwrap();
        let verification = report.verification.unwrap();
        assert!(!report.is_ok());
        assert_eq!(
            verification.outcome,
            VerifyOutcome::Mismatch {
                offset: 70,
                expected: 0xA5,
                actual: 0x00
            }
        );
        assert_eq!(verification.mismatch_address(), Some(70));
        assert_eq!(verification.bytes_verified, 70);
        assert_eq!(target.resets().last(), Some(&Level::High));
    }

    #[test]
    fn test_timeout_releases_reset() {
        let image = FirmwareImage::from_raw(vec![0x00; 256], 0);
        let mut target = MockTarget::new(0x8000);
        target.set_busy_after_write(u32::MAX);

        let result =
            write_image(&mut target, &atmega328(), &image, &WriteOptions::default(), &mut NoProgress);
        assert_eq!(result, Err(Error::DeviceTimeout { word_address: 0 }));
        assert_eq!(target.transmitted_with_opcode(opcodes::WRITE_PAGE).len(), 1);
        assert_eq!(
            target.resets(),
            vec![Level::Low, Level::High, Level::Low, Level::High]
        );
    }

    #[test]
    fn test_transfer_error_releases_reset() {
        let image = FirmwareImage::from_raw(vec![0x00; 16], 0);
        let mut target = MockTarget::new(0x8000);
        target.set_fail_transfers(true);

        let result =
            write_image(&mut target, &atmega328(), &image, &WriteOptions::default(), &mut NoProgress);
        assert_eq!(result, Err(Error::SpiTransferFailed));
        assert_eq!(target.resets(), vec![Level::Low, Level::High]);
    }

    #[test]
    fn test_read_back_poll_session() {
        let profile = DeviceProfile::new(0x4000, 128, 30, BusyMode::ReadBackPoll);
        let mut data = vec![0xFF; 128];
        data[3] = 0x42;
        let image = FirmwareImage::from_raw(data, 0x80);
        let mut target = MockTarget::new(0x4000);
        target.set_busy_after_write(2);
        let options = WriteOptions {
            erase: false,
            ..WriteOptions::default()
        };

        let report = write_image(&mut target, &profile, &image, &options, &mut NoProgress).unwrap();
        assert_eq!(report.pages_written, 1);
        assert!(target.transmitted_with_opcode(opcodes::POLL_RDY_BSY).is_empty());

        // Probe at page word 0x40 + 3/2, odd offset reads the high byte
        let probes = target.transmitted_with_opcode(opcodes::READ_HIGH);
        assert_eq!(probes.len(), 3);
        assert!(probes.iter().all(|f| f == &vec![0x28, 0x00, 0x41]));
        assert_eq!(target.memory()[0x83], 0x42);
    }

    #[test]
    fn test_verify_image() {
        let image = FirmwareImage::from_raw(vec![0x5A; 64], 0x100);
        let mut target = MockTarget::new(0x8000);
        target.memory_mut()[0x100..0x140].fill(0x5A);

        let report = verify_image(&mut target, &atmega328(), &image, &mut NoProgress).unwrap();
        assert!(report.is_match());
        assert_eq!(report.bytes_verified, 64);
        assert!(target.transmitted_with_opcode(opcodes::WRITE_PAGE).is_empty());
        assert_eq!(target.resets(), vec![Level::Low, Level::High]);
    }

    #[test]
    fn test_verify_stops_at_first_mismatching_segment() {
        let image = FirmwareImage::from_segments(vec![
            Segment::new(0x000, vec![0x01; 8]),
            Segment::new(0x100, vec![0x02; 8]),
            Segment::new(0x200, vec![0x03; 8]),
        ])
        .unwrap();
        let mut target = MockTarget::new(0x8000);
        target.memory_mut()[..8].fill(0x01);

        let report = verify_image(&mut target, &atmega328(), &image, &mut NoProgress).unwrap();
        assert_eq!(report.segment_address, 0x100);
        assert_eq!(report.mismatch_address(), Some(0x100));
        assert_eq!(report.bytes_verified, 8);
        // Nothing read from the third segment
        assert!(!target
            .transmitted_with_opcode(opcodes::READ_LOW)
            .contains(&vec![0x20, 0x01, 0x00]));
    }
}
