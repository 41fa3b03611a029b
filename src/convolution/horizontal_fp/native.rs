use crate::convolution::CoefficientTable;
use crate::pixels::FloatPixel;

#[inline(always)]
pub(crate) fn resize_line_h<P: FloatPixel>(
    table: &CoefficientTable,
    src: &[P],
    dst: &mut [P],
    left: usize,
    right: usize,
) {
    let filter_width = table.filter_width() as usize;
    let dst_pixels = dst[left..right].iter_mut();
    for ((dst_pixel, &top), j) in dst_pixels.zip(&table.left()[left..right]).zip(left..) {
        let top = top as usize;
        let mut accum = 0f32;
        for (&coeff, &x) in table.coeffs(j).iter().zip(&src[top..top + filter_width]) {
            accum += coeff * x.to_f32();
        }
        *dst_pixel = P::from_f32(accum);
    }
}
