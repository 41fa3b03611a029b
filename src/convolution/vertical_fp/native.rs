use crate::convolution::CoefficientTable;
use crate::pixels::FloatPixel;
use crate::LineBuffer;

#[inline(always)]
pub(crate) fn resize_line_v<P: FloatPixel>(
    table: &CoefficientTable,
    src: &LineBuffer<P>,
    dst: &mut [P],
    i: usize,
    left: usize,
    right: usize,
) {
    let top = table.left()[i];
    let coeffs = table.coeffs(i);
    for (dst_pixel, j) in dst[left..right].iter_mut().zip(left..) {
        let mut accum = 0f32;
        for (&coeff, y) in coeffs.iter().zip(top..) {
            accum += coeff * src.row(y)[j].to_f32();
        }
        *dst_pixel = P::from_f32(accum);
    }
}
