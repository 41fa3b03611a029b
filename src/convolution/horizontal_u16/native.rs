use crate::convolution::{CoefficientTable, FixedPointCodec};

#[inline(always)]
pub(crate) fn resize_line_h(
    table: &CoefficientTable,
    codec: FixedPointCodec,
    src: &[u16],
    dst: &mut [u16],
    left: usize,
    right: usize,
) {
    let filter_width = table.filter_width() as usize;
    let dst_pixels = dst[left..right].iter_mut();
    for ((dst_pixel, &top), j) in dst_pixels.zip(&table.left()[left..right]).zip(left..) {
        let top = top as usize;
        let mut accum = 0i32;
        for (&coeff, &x) in table.coeffs_i16(j).iter().zip(&src[top..top + filter_width]) {
            accum = accum.wrapping_add(coeff as i32 * FixedPointCodec::unpack(x));
        }
        *dst_pixel = codec.pack(accum);
    }
}
