use criterion::{Criterion, black_box, criterion_group, criterion_main};
use physl_transpile::{
    PhyslTranspiler, PythonTranspiler, SexprTranspiler, Task, build_transpiler, tasks_from_source,
};

/// A module of numeric kernels, repeated to give the reader and the
/// backends a few hundred functions to chew on.
fn kernels(copies: usize) -> String {
    let mut source = String::from("import numpy as np\n");
    for i in 0..copies {
        source.push_str(&format!(
            r#"
def kernel_{i}(a, b, n):
    acc = np.zeros(n)
    for k in range(n):
        if a[k] > b[k] and k % 2 == 0:
            acc[k] = a[k] * b[k] + {i}
        else:
            acc[k] = -a[k] / (b[k] + 1.5)
    total = np.sum(acc, axis=0)
    while total > 100:
        total = total / 2
    return total
"#
        ));
    }
    source
}

fn bench_read(c: &mut Criterion) {
    let source = kernels(200);

    c.bench_function("read_python_200_functions", |b| {
        b.iter(|| tasks_from_source(black_box(&source)).unwrap())
    });
}

fn bench_backends(c: &mut Criterion) {
    let tasks: Vec<Task> = tasks_from_source(&kernels(200)).unwrap();

    c.bench_function("physl_200_functions", |b| {
        b.iter(|| {
            for task in &tasks {
                black_box(build_transpiler::<PhyslTranspiler>(task).unwrap().to_string());
            }
        })
    });

    c.bench_function("python_200_functions", |b| {
        b.iter(|| {
            for task in &tasks {
                black_box(build_transpiler::<PythonTranspiler>(task).unwrap().to_string());
            }
        })
    });

    c.bench_function("sexpr_200_functions", |b| {
        b.iter(|| {
            for task in &tasks {
                black_box(build_transpiler::<SexprTranspiler>(task).unwrap().to_string());
            }
        })
    });
}

criterion_group!(benches, bench_read, bench_backends);
criterion_main!(benches);
