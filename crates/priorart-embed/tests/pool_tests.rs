use candle_core::{DType, Device, Tensor};
use priorart_embed::masked_mean_l2;

fn unit(v: &[f32]) -> Vec<f32> {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    v.iter().map(|x| x / norm).collect()
}

fn assert_close(got: &[f32], want: &[f32]) {
    for (a, b) in got.iter().zip(want) {
        assert!((a - b).abs() < 1e-5, "got {got:?}, want {want:?}");
    }
}

#[test]
fn padding_tokens_do_not_shift_the_mean() {
    let dev = Device::Cpu;
    // Row 0 has one real token and one pad; row 1 has two real tokens.
    let hidden = Tensor::from_slice(
        &[1.0f32, 2.0, 3.0, 4.0, 9.0, 9.0, 9.0, 9.0, 2.0, 0.0, 0.0, 0.0, 0.0, 2.0, 0.0, 0.0],
        (2, 2, 4),
        &dev,
    )
    .unwrap();
    let mask = Tensor::from_slice(&[1i64, 0, 1, 1], (2, 2), &dev).unwrap().to_dtype(DType::F32).unwrap();

    let pooled: Vec<Vec<f32>> = masked_mean_l2(&hidden, &mask).unwrap().to_vec2().unwrap();
    assert_eq!(pooled.len(), 2);
    assert_close(&pooled[0], &unit(&[1.0, 2.0, 3.0, 4.0]));
    assert_close(&pooled[1], &unit(&[1.0, 1.0, 0.0, 0.0]));
}

#[test]
fn mismatched_shapes_are_errors() {
    let dev = Device::Cpu;
    let flat = Tensor::zeros((2, 4), DType::F32, &dev).unwrap();
    let mask = Tensor::ones((2, 4), DType::F32, &dev).unwrap();
    assert!(masked_mean_l2(&flat, &mask).is_err(), "hidden states must be rank 3");

    let hidden = Tensor::ones((1, 2, 4), DType::F32, &dev).unwrap();
    let long_mask = Tensor::ones((1, 3), DType::F32, &dev).unwrap();
    assert!(masked_mean_l2(&hidden, &long_mask).is_err(), "mask longer than the sequence");
}
