use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use tiled_resize::pixels::Pixel;
use tiled_resize::testing::{self, PixelTestingExt};
use tiled_resize::{
    Axis, CoefficientTable, CpuExtensions, ImageFilter, LineBuffer, LineBufferMut,
    ResizeFilterBuilder, ScratchBuffer, UNBOUNDED_MASK,
};

const SRC_WIDTH: u32 = 2048;
const SRC_HEIGHT: u32 = 1536;
const DST_WIDTH: u32 = 852;
const DST_HEIGHT: u32 = 567;

fn build_filter<P: Pixel>(
    axis: Axis,
    dimension: u32,
    table: CoefficientTable,
    cpu_extensions: CpuExtensions,
) -> Box<dyn ImageFilter> {
    let mut builder = ResizeFilterBuilder::new(axis, P::pixel_type(), dimension);
    unsafe {
        builder.set_cpu_extensions(cpu_extensions);
    }
    builder.build(table).unwrap()
}

fn bench_stage<P: PixelTestingExt>(c: &mut Criterion, axis: Axis) {
    let (src_width, src_height, table, dimension) = match axis {
        Axis::Horizontal => (
            SRC_WIDTH,
            SRC_HEIGHT,
            testing::triangle_table(SRC_WIDTH, DST_WIDTH),
            SRC_HEIGHT,
        ),
        Axis::Vertical => (
            DST_WIDTH,
            SRC_HEIGHT,
            testing::triangle_table(SRC_HEIGHT, DST_HEIGHT),
            DST_WIDTH,
        ),
    };
    let src = testing::noise_image::<P>(src_width, src_height, 16);
    let mut group = c.benchmark_group(format!("{:?} {}", axis, P::pixel_type_str()));

    for cpu in CpuExtensions::supported() {
        let filter = build_filter::<P>(axis, dimension, table.clone(), cpu);
        let attributes = filter.image_attributes();
        let width = attributes.width;
        let mut dst = vec![P::default(); (width * attributes.height) as usize];
        let mut tmp = ScratchBuffer::new(filter.tmp_size(0, width).unwrap()).unwrap();
        let src_buffer = P::image_buffer(
            LineBuffer::new(&src, src_width, src_width as usize, UNBOUNDED_MASK).unwrap(),
        );
        let mut dst_buffer = P::image_buffer_mut(
            LineBufferMut::new(&mut dst, width, width as usize, UNBOUNDED_MASK).unwrap(),
        );
        let step = filter.simultaneous_lines() as usize;

        group.bench_function(BenchmarkId::from_parameter(format!("{:?}", cpu)), |b| {
            b.iter(|| {
                for i in (0..attributes.height).step_by(step) {
                    filter
                        .process(&mut tmp, &src_buffer, &mut dst_buffer, i, 0, width)
                        .unwrap();
                }
            })
        });
    }
    group.finish();
}

fn resize_benches(c: &mut Criterion) {
    for axis in [Axis::Horizontal, Axis::Vertical] {
        bench_stage::<u16>(c, axis);
        bench_stage::<half::f16>(c, axis);
        bench_stage::<f32>(c, axis);
    }
}

criterion_group!(benches, resize_benches);
criterion_main!(benches);
