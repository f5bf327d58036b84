// Property tests for chunked transfer planning and execution
use proptest::prelude::*;
use xbackdrop::compositor::composite;
use xbackdrop::config::{PUT_IMAGE_HEADER_BYTES, WallpaperConfig};
use xbackdrop::outputs::OutputRect;
use xbackdrop::placement::PlacementMode;
use xbackdrop::source::SourceImage;
use xbackdrop::transfer::{
    PixmapSink, TransferError, TransferOrigin, plan_transfer, split_rows, upload,
};

/// Collects every put and checks it against the request limit.
struct CountingSink {
    max_request_units: u32,
    puts: Vec<(i16, u16, usize)>,
}

impl PixmapSink for CountingSink {
    fn max_request_units(&self) -> u32 {
        self.max_request_units
    }

    fn depth(&self) -> u8 {
        24
    }

    fn put_rows(
        &mut self,
        _x: i16,
        y: i16,
        width: u16,
        rows: u16,
        data: &[u8],
    ) -> Result<(), TransferError> {
        assert_eq!(data.len(), width as usize * rows as usize * 4);
        self.puts.push((y, rows, data.len()));
        Ok(())
    }
}

proptest! {
    #[test]
    fn split_rows_is_contiguous(rows in 0u32..5000, max in 1u32..600) {
        let chunks = split_rows(rows, max);
        let mut next = 0u32;
        for chunk in &chunks {
            prop_assert_eq!(chunk.row_offset, next);
            prop_assert!(chunk.row_count >= 1 && chunk.row_count <= max);
            next += chunk.row_count;
        }
        prop_assert_eq!(next, rows);
    }

    #[test]
    fn plan_respects_server_limit(
        rows in 1u32..2000,
        width in 1usize..4000,
        units in 64u32..200_000,
    ) {
        let config = WallpaperConfig::default();
        let stride = width * 4;
        match plan_transfer(rows, stride, units, &config) {
            Ok(plan) => {
                prop_assert_eq!(plan.total_rows(), rows as u64);
                let limit = units as u64 * 4;
                for chunk in plan.chunks() {
                    let bytes = PUT_IMAGE_HEADER_BYTES as u64 + chunk.row_count as u64 * stride as u64;
                    prop_assert!(bytes <= limit, "chunk of {} bytes exceeds {}", bytes, limit);
                }
            }
            Err(err) => {
                let is_row_too_large = matches!(err, TransferError::RowTooLarge { .. });
                prop_assert!(is_row_too_large);
                prop_assert!(stride as u64 > units as u64 * 4 - PUT_IMAGE_HEADER_BYTES as u64);
            }
        }
    }
}

#[test]
fn full_hd_with_64k_requests_uses_135_chunks() {
    let config = WallpaperConfig {
        request_header_bytes: 32,
        ..WallpaperConfig::default()
    };
    let plan = plan_transfer(1080, 7680, 16_384, &config).unwrap();
    assert_eq!(plan.rows_per_request(), 8);
    assert_eq!(plan.chunks().len(), 135);
}

#[test]
fn single_row_beyond_budget_fails() {
    let err = plan_transfer(1, 1 << 20, 1024, &WallpaperConfig::default()).unwrap_err();
    assert!(matches!(err, TransferError::RowTooLarge { .. }));
}

#[test]
fn composed_output_is_uploaded_in_order() {
    let source = SourceImage::solid(16, 16, 0xff20_4060).unwrap();
    let output = OutputRect::named("DP-1", 100, 50, 300, 200);
    let buffer = composite(&source, &output, PlacementMode::Tile, &WallpaperConfig::default()).unwrap();

    let mut sink = CountingSink {
        max_request_units: 16_384,
        puts: Vec::new(),
    };
    let plan = upload(&buffer, &mut sink, TransferOrigin { x: 100, y: 50 }, &WallpaperConfig::default())
        .unwrap();

    assert_eq!(sink.puts.len(), plan.chunks().len());
    let rows: u32 = sink.puts.iter().map(|&(_, rows, _)| rows as u32).sum();
    assert_eq!(rows, 200);
    assert_eq!(sink.puts[0].0, 50);
    assert!(sink.puts.windows(2).all(|w| w[0].0 < w[1].0));
}
