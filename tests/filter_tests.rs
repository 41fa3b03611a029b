use tiled_resize::testing;
use tiled_resize::{
    select_buffer_mask, Axis, CoefficientTable, CpuExtensions, FilterFlags, ImageAttributes,
    ImageBuffer, ImageBufferMut, ImageFilter, LineBuffer, LineBufferMut, PixelType,
    ResizeError, ResizeFilterBuilder, ScratchBuffer, BUFFER_MAX, UNBOUNDED_MASK,
};

fn build_filter(
    axis: Axis,
    pixel_type: PixelType,
    dimension: u32,
    table: CoefficientTable,
    cpu_extensions: CpuExtensions,
) -> Box<dyn ImageFilter> {
    let mut builder = ResizeFilterBuilder::new(axis, pixel_type, dimension);
    unsafe {
        builder.set_cpu_extensions(cpu_extensions);
    }
    builder.build(table).unwrap()
}

const PIXEL_TYPES: [PixelType; 3] = [PixelType::U16, PixelType::F16, PixelType::F32];

#[test]
fn horizontal_contract() {
    let table = testing::triangle_table(20, 8);
    let filter_width = table.filter_width();
    assert_eq!(filter_width, 5);
    let left = table.left().to_vec();

    for cpu in CpuExtensions::supported() {
        for pixel_type in PIXEL_TYPES {
            let filter = build_filter(Axis::Horizontal, pixel_type, 10, table.clone(), cpu);
            assert_eq!(
                filter.flags(),
                FilterFlags {
                    same_row: true,
                    entire_row: false,
                    entire_plane: false,
                }
            );
            assert_eq!(
                filter.image_attributes(),
                ImageAttributes {
                    width: 8,
                    height: 10,
                    pixel_type,
                }
            );
            assert_eq!(filter.required_col_range(2, 5), left[2]..left[4] + filter_width);
            assert_eq!(filter.required_col_range(0, 8), left[0]..left[7] + filter_width);

            let lines = filter.simultaneous_lines();
            assert_eq!(filter.max_buffering(), lines);
            assert_eq!(filter.required_row_range(0), 0..lines.min(10));
            assert_eq!(filter.required_row_range(9), 9..10);
            if cpu == CpuExtensions::None {
                assert_eq!(lines, 1);
                assert_eq!(filter.required_row_range(3), 3..4);
                assert_eq!(filter.tmp_size(0, 8).unwrap(), 0);
            }
        }
    }
}

#[test]
fn vertical_contract() {
    let table = testing::triangle_table(20, 8);
    let filter_width = table.filter_width();
    let left = table.left().to_vec();

    for cpu in CpuExtensions::supported() {
        for pixel_type in PIXEL_TYPES {
            let filter = build_filter(Axis::Vertical, pixel_type, 33, table.clone(), cpu);
            assert_eq!(filter.flags(), FilterFlags::default());
            assert_eq!(
                filter.image_attributes(),
                ImageAttributes {
                    width: 33,
                    height: 8,
                    pixel_type,
                }
            );
            for i in 0..8 {
                assert_eq!(
                    filter.required_row_range(i),
                    left[i as usize]..left[i as usize] + filter_width
                );
            }
            assert_eq!(filter.required_col_range(3, 17), 3..17);
            assert_eq!(filter.simultaneous_lines(), 1);
            assert_eq!(filter.max_buffering(), filter_width);
            // Taps fit into one chunk, no accumulator is required.
            assert_eq!(filter.tmp_size(0, 33).unwrap(), 0);
        }
    }
}

#[test]
fn unsorted_table_contract() {
    let table = testing::reversed_table(20, 8);
    assert!(!table.is_sorted());

    for cpu in CpuExtensions::supported() {
        let horizontal = build_filter(Axis::Horizontal, PixelType::U16, 4, table.clone(), cpu);
        assert_eq!(
            horizontal.flags(),
            FilterFlags {
                same_row: true,
                entire_row: true,
                entire_plane: false,
            }
        );
        assert_eq!(horizontal.required_col_range(2, 3), 0..20);

        let vertical = build_filter(Axis::Vertical, PixelType::F32, 4, table.clone(), cpu);
        assert_eq!(
            vertical.flags(),
            FilterFlags {
                same_row: false,
                entire_row: true,
                entire_plane: true,
            }
        );
        assert_eq!(vertical.required_row_range(5), 0..20);
        assert_eq!(vertical.max_buffering(), BUFFER_MAX);
        assert_eq!(select_buffer_mask(vertical.max_buffering()), UNBOUNDED_MASK);
    }
}

#[cfg(target_arch = "x86_64")]
#[test]
fn avx2_tmp_sizes() {
    if !CpuExtensions::Avx2.is_supported() {
        return;
    }
    let cpu = CpuExtensions::Avx2;
    // 100 -> 10 samples, every output sample requires 20 input samples.
    let table = testing::uneven_table(100, 10, 20);
    let left = table.left().to_vec();
    let (lo, hi) = (left[3] as usize, left[6] as usize + 20);

    let filter = build_filter(Axis::Horizontal, PixelType::U16, 40, table.clone(), cpu);
    assert_eq!(filter.simultaneous_lines(), 16);
    assert_eq!(filter.required_row_range(30), 30..40);
    assert_eq!(
        filter.tmp_size(3, 7).unwrap(),
        (hi - lo / 16 * 16 + 16) * 16 * 2
    );

    for (pixel_type, size) in [(PixelType::F16, 2), (PixelType::F32, 4)] {
        let filter = build_filter(Axis::Horizontal, pixel_type, 40, table.clone(), cpu);
        assert_eq!(filter.simultaneous_lines(), 8);
        assert_eq!(
            filter.tmp_size(3, 7).unwrap(),
            (hi - lo / 8 * 8 + 8) * 8 * size
        );
    }

    let filter = build_filter(Axis::Vertical, PixelType::U16, 40, table.clone(), cpu);
    assert_eq!(filter.tmp_size(3, 37).unwrap(), 48 * 4);
    let filter = build_filter(Axis::Vertical, PixelType::F16, 40, table.clone(), cpu);
    assert_eq!(filter.tmp_size(3, 37).unwrap(), 40 * 4);
}

#[test]
fn unsupported_configurations() {
    let table = testing::identity_table(4);
    let result = ResizeFilterBuilder::new(Axis::Horizontal, PixelType::U8, 4).build(table.clone());
    assert_eq!(
        result.err(),
        Some(ResizeError::UnsupportedPixelType(PixelType::U8))
    );

    for depth in [0, 17, 32] {
        let result = ResizeFilterBuilder::new(Axis::Vertical, PixelType::U16, 4)
            .depth(depth)
            .build(table.clone());
        assert_eq!(result.err(), Some(ResizeError::UnsupportedBitDepth(depth)));
    }

    // Depth affects only integer samples.
    assert!(ResizeFilterBuilder::new(Axis::Vertical, PixelType::F32, 4)
        .depth(0)
        .build(table.clone())
        .is_ok());

    let result = ResizeFilterBuilder::new(Axis::Horizontal, PixelType::F16, 0).build(table);
    assert_eq!(result.err(), Some(ResizeError::ZeroDimension));
}

#[test]
fn different_types_of_pixels() {
    let filter = ResizeFilterBuilder::new(Axis::Horizontal, PixelType::U16, 2)
        .build(testing::identity_table(4))
        .unwrap();
    let src_pixels = [0f32; 8];
    let mut dst_pixels = [0u16; 8];
    let mut f32_pixels = [0f32; 8];
    let mut tmp = ScratchBuffer::new(filter.tmp_size(0, 4).unwrap()).unwrap();

    let src: ImageBuffer = LineBuffer::new(&src_pixels, 4, 4, UNBOUNDED_MASK)
        .unwrap()
        .into();
    let mut dst: ImageBufferMut = LineBufferMut::new(&mut dst_pixels, 4, 4, UNBOUNDED_MASK)
        .unwrap()
        .into();
    assert!(filter.process(&mut tmp, &src, &mut dst, 0, 0, 4).is_err());
    assert_eq!(
        tiled_resize::process_plane(filter.as_ref(), &src, &mut dst).err(),
        Some(ResizeError::DifferentTypesOfPixels)
    );

    let mut dst: ImageBufferMut = LineBufferMut::new(&mut f32_pixels, 4, 4, UNBOUNDED_MASK)
        .unwrap()
        .into();
    assert!(filter.process(&mut tmp, &src, &mut dst, 0, 0, 4).is_err());
}

#[test]
fn raw_bytes_buffers() {
    let filter = ResizeFilterBuilder::new(Axis::Vertical, PixelType::F32, 3)
        .build(testing::identity_table(2))
        .unwrap();
    let src_pixels = [1f32, 2., 3., 4., 5., 6.];
    let mut dst_pixels = [0f32; 6];
    let stride_bytes = 3 * PixelType::F32.size();
    assert_eq!(stride_bytes, 12);
    let src = ImageBuffer::from_bytes(
        PixelType::F32,
        bytemuck::cast_slice(&src_pixels),
        3,
        stride_bytes,
        UNBOUNDED_MASK,
    )
    .unwrap();
    let mut dst = ImageBufferMut::from_bytes(
        PixelType::F32,
        bytemuck::cast_slice_mut(&mut dst_pixels),
        3,
        stride_bytes,
        UNBOUNDED_MASK,
    )
    .unwrap();
    tiled_resize::process_plane(filter.as_ref(), &src, &mut dst).unwrap();
    drop(dst);
    assert_eq!(dst_pixels, src_pixels);
}

#[test]
fn regions_out_of_bounds() {
    let table = testing::triangle_table(20, 8);
    let src_pixels = testing::noise_image::<u16>(32, 20, 16);

    for cpu in CpuExtensions::supported() {
        for axis in [Axis::Horizontal, Axis::Vertical] {
            let dimension = match axis {
                Axis::Horizontal => 20,
                Axis::Vertical => 32,
            };
            let filter = build_filter(axis, PixelType::U16, dimension, table.clone(), cpu);
            let attributes = filter.image_attributes();
            let width = attributes.width;
            let mut tmp = ScratchBuffer::new(filter.tmp_size(0, width).unwrap()).unwrap();
            let src: ImageBuffer = LineBuffer::new(&src_pixels, 32, 32, UNBOUNDED_MASK)
                .unwrap()
                .into();
            let out_of_bounds = |row: u32, left: u32, right: u32| -> Result<(), ResizeError> {
                Err(ResizeError::RegionIsOutOfBounds { row, left, right })
            };

            // Destination is narrower than requested columns.
            let mut backing = vec![7u16; 32 * 20];
            {
                let mut dst: ImageBufferMut =
                    LineBufferMut::new(&mut backing[..4], 4, 4, UNBOUNDED_MASK)
                        .unwrap()
                        .into();
                let result = filter.process(&mut tmp, &src, &mut dst, 0, 0, width);
                assert_eq!(result, out_of_bounds(0, 0, width), "{:?} {:?}", axis, cpu);
            }
            assert!(backing.iter().all(|&v| v == 7), "{:?} {:?}", axis, cpu);

            let mut dst: ImageBufferMut =
                LineBufferMut::new(&mut backing, 32, 32, UNBOUNDED_MASK)
                    .unwrap()
                    .into();
            // Columns beyond the output image.
            let result = filter.process(&mut tmp, &src, &mut dst, 0, 0, width + 1);
            assert_eq!(result, out_of_bounds(0, 0, width + 1));
            // Rows beyond the output image.
            let height = attributes.height;
            let result = filter.process(&mut tmp, &src, &mut dst, height, 0, width);
            assert_eq!(result, out_of_bounds(height, 0, width));
            let result = filter.process(&mut tmp, &src, &mut dst, u32::MAX, 0, width);
            assert_eq!(result, out_of_bounds(u32::MAX, 0, width));

            // Source is narrower than required columns.
            let narrow: ImageBuffer = LineBuffer::new(&src_pixels, 5, 32, UNBOUNDED_MASK)
                .unwrap()
                .into();
            let result = filter.process(&mut tmp, &narrow, &mut dst, 0, 0, width);
            assert_eq!(result, out_of_bounds(0, 0, width));

            drop(dst);
            assert!(backing.iter().all(|&v| v == 7), "{:?} {:?}", axis, cpu);
        }
    }
}
