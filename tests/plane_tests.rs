use tiled_resize::testing;
use tiled_resize::{
    process_plane, Axis, ImageBufferError, LineBuffer, LineBufferMut, LineStore, PixelType,
    ResizeError, ResizeFilterBuilder, UNBOUNDED_MASK,
};

fn two_pass_resize(src: &[u16], src_width: u32, src_height: u32) -> Vec<u16> {
    let (dst_width, dst_height) = (31, 17);
    let horizontal = ResizeFilterBuilder::new(Axis::Horizontal, PixelType::U16, src_height)
        .build(testing::triangle_table(src_width, dst_width))
        .unwrap();
    let vertical = ResizeFilterBuilder::new(Axis::Vertical, PixelType::U16, dst_width)
        .build(testing::triangle_table(src_height, dst_height))
        .unwrap();
    let tmp = testing::run_filter(horizontal.as_ref(), src, src_width).unwrap();
    testing::run_filter(vertical.as_ref(), &tmp, dst_width).unwrap()
}

#[test]
fn two_pass_resize_of_gradient() {
    let (width, height) = (90u32, 51u32);
    let src: Vec<u16> = (0..height)
        .flat_map(|y| (0..width).map(move |x| (x * 500 + y * 100) as u16))
        .collect();
    let dst = two_pass_resize(&src, width, height);
    assert_eq!(dst.len(), 31 * 17);
    // Gradient stays monotonic in both directions.
    for row in dst.chunks_exact(31) {
        assert!(row.windows(2).all(|w| w[0] < w[1]));
    }
    for x in 0..31 {
        let column: Vec<u16> = dst.iter().skip(x).step_by(31).copied().collect();
        assert!(column.windows(2).all(|w| w[0] < w[1]));
    }
}

#[test]
fn buffers_must_hold_plane() {
    let filter = ResizeFilterBuilder::new(Axis::Vertical, PixelType::F32, 8)
        .build(testing::triangle_table(10, 4))
        .unwrap();
    let src_pixels = vec![0f32; 8 * 10];
    let mut dst_pixels = vec![0f32; 8 * 4];
    let invalid_size = Err(ResizeError::ImageBuffer(ImageBufferError::InvalidBufferSize));

    // Ring buffer can't keep all input rows.
    let ring = LineStore::<f32>::with_capacity(8, 4).unwrap();
    let dst = LineBufferMut::new(&mut dst_pixels, 8, 8, UNBOUNDED_MASK).unwrap();
    let result = process_plane(filter.as_ref(), &ring.as_buffer().into(), &mut dst.into());
    assert_eq!(result, invalid_size);

    // Source is too narrow.
    let src = LineBuffer::new(&src_pixels, 7, 8, UNBOUNDED_MASK).unwrap();
    let dst = LineBufferMut::new(&mut dst_pixels, 8, 8, UNBOUNDED_MASK).unwrap();
    let result = process_plane(filter.as_ref(), &src.into(), &mut dst.into());
    assert_eq!(result, invalid_size);

    // Destination keeps only 3 rows.
    let src = LineBuffer::new(&src_pixels, 8, 8, UNBOUNDED_MASK).unwrap();
    let dst = LineBufferMut::new(&mut dst_pixels[..8 * 3], 8, 8, UNBOUNDED_MASK).unwrap();
    let result = process_plane(filter.as_ref(), &src.into(), &mut dst.into());
    assert_eq!(result, invalid_size);

    let dst = LineBufferMut::new(&mut dst_pixels, 8, 8, UNBOUNDED_MASK).unwrap();
    assert!(process_plane(filter.as_ref(), &src.into(), &mut dst.into()).is_ok());
}

#[cfg(feature = "rayon")]
mod rayon_tests {
    use super::*;
    use tiled_resize::{par_process_plane, CpuExtensions, ImageBufferMut, ImageFilter};

    fn par_run(filter: &dyn ImageFilter, src: &[u16], src_width: u32) -> Vec<u16> {
        let attributes = filter.image_attributes();
        let width = attributes.width;
        let mut dst = vec![0u16; (width * attributes.height) as usize];
        let src = LineBuffer::new(src, src_width, src_width as usize, UNBOUNDED_MASK).unwrap();
        let dst_buffer: ImageBufferMut =
            LineBufferMut::new(&mut dst, width, width as usize, UNBOUNDED_MASK)
                .unwrap()
                .into();
        par_process_plane(filter, &src.into(), dst_buffer).unwrap();
        dst
    }

    #[test]
    fn parallel_processing_matches_sequential() {
        let (width, height) = (300u32, 411u32);
        let src = testing::noise_image::<u16>(width, height, 16);
        for cpu in CpuExtensions::supported() {
            for axis in [Axis::Horizontal, Axis::Vertical] {
                let (table, dimension) = match axis {
                    Axis::Horizontal => (testing::triangle_table(width, 123), height),
                    Axis::Vertical => (testing::triangle_table(height, 97), width),
                };
                let mut builder = ResizeFilterBuilder::new(axis, PixelType::U16, dimension);
                unsafe {
                    builder.set_cpu_extensions(cpu);
                }
                let filter = builder.build(table).unwrap();
                let expected = testing::run_filter(filter.as_ref(), &src, width).unwrap();
                let result = par_run(filter.as_ref(), &src, width);
                assert!(result == expected, "{:?} {:?}", axis, cpu);
            }
        }
    }
}
