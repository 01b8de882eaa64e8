use criterion::{black_box, criterion_group, criterion_main, Criterion};

use tabreg::{loss, Activation, NetworkBuilder};

fn forward_bench(c: &mut Criterion) {
    let net = NetworkBuilder::regression(16, &[64, 64], 4)
        .unwrap()
        .build_with_seed(0)
        .unwrap();
    let mut scratch = net.scratch();
    let input = vec![0.1_f32; net.input_dim()];

    c.bench_function("forward_16_64_64_4", |b| {
        b.iter(|| {
            let out = net.forward(black_box(&input), &mut scratch);
            black_box(out);
        })
    });
}

fn backward_bench(c: &mut Criterion) {
    let net = NetworkBuilder::new(16)
        .unwrap()
        .add_layer(64, Activation::Tanh)
        .unwrap()
        .add_layer(64, Activation::Tanh)
        .unwrap()
        .add_layer(4, Activation::Identity)
        .unwrap()
        .build_with_seed(0)
        .unwrap();
    let mut scratch = net.scratch();
    let mut grads = net.gradients();
    let input = vec![0.1_f32; net.input_dim()];
    let target = vec![0.0_f32; net.output_dim()];

    net.forward(&input, &mut scratch);
    loss::mse_backward(scratch.output(), &target, grads.d_output_mut());

    c.bench_function("backward_16_64_64_4", |b| {
        b.iter(|| {
            let d_input = net.backward(black_box(&input), black_box(&scratch), &mut grads);
            black_box(d_input);
        })
    });
}

criterion_group!(benches, forward_bench, backward_bench);
criterion_main!(benches);
