pub mod onnx_emotion_engine;
